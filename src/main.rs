use std::io::{self, Read};
use std::process;

use anyhow::Result;

use hcertdec::config::{Config, OutputFormat};
use hcertdec::DecodedCertificate;

fn print(certificate: &DecodedCertificate, config: &Config) -> Result<()> {
    match config.output {
        OutputFormat::Debug => println!("{:#?}", certificate),
        OutputFormat::Json => println!("{}", serde_json::to_string(certificate)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config = Config::from_env();

    let mut data = String::new();
    let mut stdin = io::stdin();
    stdin.read_to_string(&mut data)?;

    let mut decoded = 0;
    for (line, result) in hcertdec::decode_all(&data) {
        match result {
            Ok(certificate) => {
                print(&certificate, &config)?;
                decoded += 1;
            }
            Err(e) => eprintln!("line {}: {}", line, e),
        }
    }

    if decoded == 0 {
        eprintln!("no certificate could be decoded");
        process::exit(1);
    }

    Ok(())
}
