//! Command line front end for certreq
//!
//! Sources the passphrase, output paths, and subject fields, then invokes
//! the library once. Failure text goes to standard output and the process
//! exits with 1, matching the historical scripted callers.

use clap::Parser;
use colored::Colorize;

use certreq::{issue_csr_with_bits, CsrSubject};

#[derive(Parser)]
#[command(name = "certreq")]
#[command(about = "Generate an encrypted RSA key and a PKCS#10 certificate request")]
#[command(version)]
struct Cli {
    /// Passphrase protecting the private key
    #[arg(short, long)]
    password: String,

    /// Private key output path (encrypted PKCS#8 PEM)
    #[arg(short, long, default_value = "key.pem")]
    key_out: String,

    /// Certificate request output path (PEM)
    #[arg(short, long, default_value = "req.pem")]
    csr_out: String,

    /// Subject common name (CN)
    #[arg(long)]
    common_name: String,

    /// Subject organization (O)
    #[arg(long)]
    organization: Option<String>,

    /// Subject organizational unit (OU)
    #[arg(long)]
    organizational_unit: Option<String>,

    /// Subject country (C)
    #[arg(long)]
    country: Option<String>,

    /// Subject state or province (ST)
    #[arg(long)]
    state: Option<String>,

    /// Subject locality (L)
    #[arg(long)]
    locality: Option<String>,

    /// Subject email address
    #[arg(long)]
    email: Option<String>,

    /// RSA modulus size in bits
    #[arg(long, default_value_t = 4096, value_parser = parse_bits)]
    bits: usize,
}

fn parse_bits(s: &str) -> Result<usize, String> {
    match s.parse() {
        Ok(bits @ (2048 | 3072 | 4096)) => Ok(bits),
        Ok(other) => Err(format!(
            "unsupported key size: {} (expected 2048, 3072 or 4096)",
            other
        )),
        Err(e) => Err(e.to_string()),
    }
}

fn main() {
    let cli = Cli::parse();
    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let subject = CsrSubject {
        common_name: cli.common_name,
        organization: cli.organization,
        organizational_unit: cli.organizational_unit,
        country: cli.country,
        state: cli.state,
        locality: cli.locality,
        email: cli.email,
    };

    println!("{}", format!("Generating RSA-{} key pair...", cli.bits).cyan());

    match issue_csr_with_bits(
        cli.password.as_bytes(),
        cli.bits,
        &cli.key_out,
        &cli.csr_out,
        subject,
    ) {
        Ok(()) => {
            println!("{} Private key saved to: {}", "✓".green(), cli.key_out);
            println!("{} Certificate request saved to: {}", "✓".green(), cli.csr_out);
            0
        }
        Err(e) => {
            println!("{}", e);
            1
        }
    }
}
