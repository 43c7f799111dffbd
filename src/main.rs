use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cryptalgo::api::{
    AsymmetricDecryptRequest, AsymmetricEncryptRequest, DeriveKeyRequest, ErrorResponse,
    HashTextRequest, KeyPairRequest, RandomBytesRequest, SymmetricDecryptRequest,
    SymmetricEncryptRequest,
};
use cryptalgo::{CryptoApi, CryptoError};

mod auth;

#[derive(Debug, Parser)]
#[command(name = "cryptalgo")]
#[command(
    version,
    about = "Symmetric and asymmetric encryption, hashing and key derivation."
)]
struct Cli {
    /// Log filter, e.g. `debug` or `cryptalgo=trace`
    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        env = "CRYPTALGO_LOG",
        default_value = "warn"
    )]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// AES-GCM key generation and authenticated encryption
    Symmetric {
        #[command(subcommand)]
        command: SymmetricCommand,
    },

    /// RSA key pairs and RSA-OAEP encryption
    Asymmetric {
        #[command(subcommand)]
        command: AsymmetricCommand,
    },

    /// Message digests of text or files
    Hash {
        #[command(subcommand)]
        command: HashCommand,
    },

    /// Random bytes and password-based key derivation
    Keys {
        #[command(subcommand)]
        command: KeysCommand,
    },
}

#[derive(Debug, Subcommand)]
enum SymmetricCommand {
    /// Generates a fresh 256-bit key
    GenerateKey,

    /// Encrypts text under a key
    #[command(arg_required_else_help = true)]
    Encrypt {
        #[arg(long)]
        key: String,
        plaintext: String,
    },

    /// Decrypts a token produced by `encrypt`
    #[command(arg_required_else_help = true)]
    Decrypt {
        #[arg(long)]
        key: String,
        ciphertext: String,
    },
}

#[derive(Debug, Subcommand)]
enum AsymmetricCommand {
    /// Generates an RSA key pair (PEM)
    GenerateKeyPair {
        /// Modulus size in bits
        #[arg(long, default_value_t = 2048)]
        key_size: usize,
    },

    /// Encrypts text with a public key
    #[command(arg_required_else_help = true)]
    Encrypt {
        /// Path to a PEM public key
        #[arg(long, value_name = "PATH")]
        public_key: PathBuf,
        plaintext: String,
    },

    /// Decrypts a ciphertext with a private key
    #[command(arg_required_else_help = true)]
    Decrypt {
        /// Path to a PEM private key
        #[arg(long, value_name = "PATH")]
        private_key: PathBuf,
        ciphertext: String,
    },
}

#[derive(Debug, Subcommand)]
enum HashCommand {
    /// Lists supported algorithms
    Algorithms,

    /// Hashes a string
    #[command(arg_required_else_help = true)]
    Text {
        #[arg(long, short, default_value = "sha256")]
        algorithm: String,
        text: String,
    },

    /// Hashes a file, or stdin when the path is `-`
    #[command(arg_required_else_help = true)]
    File {
        #[arg(long, short, default_value = "sha256")]
        algorithm: String,
        path: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum KeysCommand {
    /// Generates random bytes
    Random {
        #[arg(long, default_value_t = 32, allow_negative_numbers = true)]
        length: i64,
    },

    /// Derives a key from a password (read from CRYPTALGO_PASSWORD, stdin or a prompt)
    Derive {
        /// Base64 salt; a fresh one is generated when omitted
        #[arg(long)]
        salt: Option<String>,

        /// Output length in bytes
        #[arg(long, default_value_t = 32, allow_negative_numbers = true)]
        length: i64,

        /// PBKDF2 iteration count
        #[arg(long, env = "CRYPTALGO_ITERATIONS")]
        iterations: Option<u32>,
    },
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_pem(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn run(command: Commands) -> Result<()> {
    let api = CryptoApi::new();

    match command {
        Commands::Symmetric { command } => match command {
            SymmetricCommand::GenerateKey => emit(&api.generate_symmetric_key()?),
            SymmetricCommand::Encrypt { key, plaintext } => {
                emit(&api.symmetric_encrypt(&SymmetricEncryptRequest { plaintext, key })?)
            }
            SymmetricCommand::Decrypt { key, ciphertext } => {
                emit(&api.symmetric_decrypt(&SymmetricDecryptRequest { ciphertext, key })?)
            }
        },

        Commands::Asymmetric { command } => match command {
            AsymmetricCommand::GenerateKeyPair { key_size } => emit(&api.generate_key_pair(
                &KeyPairRequest {
                    key_size: Some(key_size),
                },
            )?),
            AsymmetricCommand::Encrypt {
                public_key,
                plaintext,
            } => {
                let public_key = read_pem(&public_key)?;
                emit(&api.asymmetric_encrypt(&AsymmetricEncryptRequest {
                    plaintext,
                    public_key,
                })?)
            }
            AsymmetricCommand::Decrypt {
                private_key,
                ciphertext,
            } => {
                let private_key = read_pem(&private_key)?;
                emit(&api.asymmetric_decrypt(&AsymmetricDecryptRequest {
                    ciphertext,
                    private_key,
                })?)
            }
        },

        Commands::Hash { command } => match command {
            HashCommand::Algorithms => emit(&api.hash_algorithms()),
            HashCommand::Text { algorithm, text } => emit(&api.hash_text(&HashTextRequest {
                text,
                algorithm: Some(algorithm),
            })?),
            HashCommand::File { algorithm, path } => {
                let reader: Box<dyn Read> = if path.as_os_str() == "-" {
                    Box::new(io::stdin().lock())
                } else {
                    Box::new(
                        File::open(&path)
                            .with_context(|| format!("failed to open {}", path.display()))?,
                    )
                };
                emit(&api.hash_file(reader, Some(algorithm.as_str()))?)
            }
        },

        Commands::Keys { command } => match command {
            KeysCommand::Random { length } => emit(&api.random_bytes(&RandomBytesRequest {
                length: Some(length),
            })?),
            KeysCommand::Derive {
                salt,
                length,
                iterations,
            } => {
                let password = auth::read_password()?;
                emit(&api.derive_key(&DeriveKeyRequest {
                    password: password.to_string(),
                    salt,
                    length: Some(length),
                    iterations,
                })?)
            }
        },
    }
}

fn error_body(err: &anyhow::Error) -> ErrorResponse {
    match err.downcast_ref::<CryptoError>() {
        Some(crypto) => ErrorResponse::from(crypto),
        None => ErrorResponse {
            error: "Io".to_string(),
            detail: format!("{err:#}"),
        },
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_new(&args.log).unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = %err, "command failed");
            let body = error_body(&err);
            match serde_json::to_string(&body) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{}: {}", body.error, body.detail),
            }
            ExitCode::FAILURE
        }
    }
}
