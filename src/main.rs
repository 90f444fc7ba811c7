//! passcrypt - password-based text and file encryption.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use passcrypt::crypto::KdfAlgorithm;
use passcrypt::{EncryptionResult, Encryptor, EncryptorConfig, Envelope};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "passcrypt")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Password-based text and file encryption",
    long_about = "Encrypts text or files with a password-derived AES-256 key and emits portable Base64 artifacts."
)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt text or a file
    Encrypt {
        /// Text to encrypt
        #[arg(long, conflicts_with = "input")]
        data: Option<String>,

        /// Input file to encrypt (default: stdin)
        #[arg(long, conflicts_with = "data")]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,

        /// PBKDF2 rounds for the parts/artifact formats
        #[arg(long)]
        iterations: Option<u32>,

        /// Output format
        #[arg(long, value_enum, default_value = "envelope")]
        format: OutputFormat,

        /// Derive envelope keys with Argon2id instead of PBKDF2
        #[arg(long)]
        argon2: bool,

        /// Read the password from this environment variable instead of prompting
        #[arg(long)]
        password_env: Option<String>,
    },

    /// Decrypt an artifact, parts JSON or envelope
    Decrypt {
        /// `salt:iv:ciphertext` artifact
        #[arg(long, conflicts_with_all = ["input", "ciphertext"])]
        artifact: Option<String>,

        /// File holding an artifact, parts JSON or envelope
        #[arg(long, conflicts_with = "ciphertext")]
        input: Option<PathBuf>,

        /// Base64 ciphertext (with --salt and --iv)
        #[arg(long, requires_all = ["salt", "iv"])]
        ciphertext: Option<String>,

        /// Base64 salt
        #[arg(long)]
        salt: Option<String>,

        /// Base64 IV
        #[arg(long)]
        iv: Option<String>,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,

        /// PBKDF2 rounds used at encryption (artifact and parts only)
        #[arg(long)]
        iterations: Option<u32>,

        /// Require the plaintext to be UTF-8 text
        #[arg(long)]
        text: bool,

        /// Read the password from this environment variable instead of prompting
        #[arg(long)]
        password_env: Option<String>,
    },

    /// Show the header of an envelope without decrypting it
    Inspect {
        /// Envelope file (JSON or binary)
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// JSON object with ciphertext, salt and iv
    Parts,
    /// Single `salt:iv:ciphertext` line
    Artifact,
    /// Self-describing JSON envelope (AES-256-GCM by default)
    Envelope,
    /// Self-describing binary envelope
    Binary,
}

/// Everything `decrypt` knows how to read.
enum Sealed {
    Parts(EncryptionResult),
    Envelope(Envelope),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => EncryptorConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EncryptorConfig::default(),
    };
    if let Commands::Encrypt { argon2: true, .. } = cli.command {
        config.envelope_kdf = KdfAlgorithm::argon2id();
    }
    let encryptor = Encryptor::new(config)?;

    match cli.command {
        Commands::Encrypt {
            data,
            input,
            output,
            iterations,
            format,
            password_env,
            ..
        } => cmd_encrypt(
            &encryptor,
            data,
            input,
            output,
            iterations,
            format,
            password_env,
        ),

        Commands::Decrypt {
            artifact,
            input,
            ciphertext,
            salt,
            iv,
            output,
            iterations,
            text,
            password_env,
        } => {
            let sealed = match (artifact, input, ciphertext, salt, iv) {
                (Some(artifact), None, None, _, _) => {
                    Sealed::Parts(Encryptor::parse_encrypted_input(&artifact)?)
                }
                (None, Some(path), None, _, _) => read_sealed(&path)?,
                (None, None, Some(ciphertext), Some(salt), Some(iv)) => {
                    Sealed::Parts(EncryptionResult {
                        ciphertext,
                        salt,
                        iv,
                    })
                }
                _ => bail!("provide one of --artifact, --input, or --ciphertext with --salt and --iv"),
            };
            cmd_decrypt(&encryptor, sealed, output, iterations, text, password_env)
        }

        Commands::Inspect { input } => cmd_inspect(&input),
    }
}

fn read_password(password_env: Option<&str>, confirm: bool) -> anyhow::Result<String> {
    if let Some(var) = password_env {
        return std::env::var(var).with_context(|| format!("environment variable {var} is not set"));
    }

    let password = rpassword::prompt_password("Password: ").context("failed to read password")?;
    if confirm {
        let again =
            rpassword::prompt_password("Confirm password: ").context("failed to read password")?;
        if password != again {
            bail!("passwords do not match");
        }
    }
    Ok(password)
}

fn cmd_encrypt(
    encryptor: &Encryptor,
    data: Option<String>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    iterations: Option<u32>,
    format: OutputFormat,
    password_env: Option<String>,
) -> anyhow::Result<()> {
    let password = read_password(password_env.as_deref(), true)?;

    let content = match (input, data) {
        (Some(path), None) => {
            std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?
        }
        (None, Some(s)) => s.into_bytes(),
        (None, None) => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            buffer
        }
        (Some(_), Some(_)) => bail!("--data and --input cannot be used together"),
    };

    let encoded = match format {
        OutputFormat::Parts => {
            let result = encryptor.encrypt_file(&content, &password, iterations)?;
            serde_json::to_string_pretty(&result)?.into_bytes()
        }
        OutputFormat::Artifact => {
            let result = encryptor.encrypt_file(&content, &password, iterations)?;
            Encryptor::format_encrypted_output(&result).into_bytes()
        }
        OutputFormat::Envelope => encryptor
            .seal_file(&content, &password)?
            .to_json()?
            .into_bytes(),
        OutputFormat::Binary => encryptor.seal_file(&content, &password)?.to_bytes()?,
    };

    info!(bytes = content.len(), "encrypted input");
    let newline = !matches!(format, OutputFormat::Binary);
    write_output(output.as_deref(), &encoded, newline)
}

fn cmd_decrypt(
    encryptor: &Encryptor,
    sealed: Sealed,
    output: Option<PathBuf>,
    iterations: Option<u32>,
    text: bool,
    password_env: Option<String>,
) -> anyhow::Result<()> {
    let password = read_password(password_env.as_deref(), false)?;

    let plaintext = match (sealed, text) {
        (Sealed::Parts(r), true) => encryptor
            .decrypt_text(&r.ciphertext, &password, &r.salt, &r.iv, iterations)?
            .into_bytes(),
        (Sealed::Parts(r), false) => {
            encryptor.decrypt_file(&r.ciphertext, &password, &r.salt, &r.iv, iterations)?
        }
        (Sealed::Envelope(envelope), true) => {
            encryptor.open_text(&envelope, &password)?.into_bytes()
        }
        (Sealed::Envelope(envelope), false) => encryptor.open_file(&envelope, &password)?,
    };

    info!(bytes = plaintext.len(), "decrypted input");
    write_output(output.as_deref(), &plaintext, false)
}

fn cmd_inspect(input: &Path) -> anyhow::Result<()> {
    let envelope = match read_sealed(input)? {
        Sealed::Envelope(envelope) => envelope,
        Sealed::Parts(_) => bail!("{} is not an envelope", input.display()),
    };

    println!("passcrypt envelope");
    println!("==================");
    println!("Version:          {}", envelope.version);
    println!("KDF:              {:?}", envelope.kdf);
    println!("Cipher:           {:?}", envelope.cipher);
    println!("Authenticated:    {}", envelope.cipher.is_authenticated());
    println!("Salt:             {}", passcrypt::encoding::to_base64(&envelope.salt));
    println!("IV length:        {} bytes", envelope.iv.len());
    println!("Ciphertext:       {} bytes", envelope.ciphertext.len());

    Ok(())
}

/// Detect a binary envelope, JSON envelope, parts JSON or artifact line.
fn read_sealed(path: &Path) -> anyhow::Result<Sealed> {
    let raw = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if Envelope::is_binary(&raw) {
        return Ok(Sealed::Envelope(Envelope::from_bytes(&raw)?));
    }

    let content = String::from_utf8(raw).context("input is neither binary nor UTF-8 text")?;
    let content = content.trim();
    if content.starts_with('{') {
        if let Ok(envelope) = Envelope::from_json(content) {
            return Ok(Sealed::Envelope(envelope));
        }
        let parts: EncryptionResult =
            serde_json::from_str(content).context("unrecognised JSON input")?;
        return Ok(Sealed::Parts(parts));
    }
    Ok(Sealed::Parts(Encryptor::parse_encrypted_input(content)?))
}

fn write_output(path: Option<&Path>, data: &[u8], newline: bool) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, data)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            if newline {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
