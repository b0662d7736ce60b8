//! Command-line interface for `aes-cfb`.

#![forbid(unsafe_code)]

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use aes_cfb::blockfile::{read_block, write_block};
use aes_cfb::{Block, Cfb128, HexWriter, Parallelism};
use aes_core::Aes128Key;
use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// AES-128 CFB CLI.
#[derive(Parser)]
#[command(
    name = "aescfb",
    version,
    author,
    about = "AES-128 in CFB mode with an optional round-by-round trace"
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file or inline text; generates a fresh key and IV unless told otherwise.
    Encrypt {
        /// Plaintext file.
        #[arg(
            long,
            value_name = "FILE",
            conflicts_with = "text",
            required_unless_present = "text"
        )]
        input: Option<PathBuf>,
        /// Inline plaintext, encoded as UTF-8.
        #[arg(long)]
        text: Option<String>,
        /// Ciphertext output path.
        #[arg(long, value_name = "FILE", default_value = "ciphertext.bin")]
        output: PathBuf,
        #[command(flatten)]
        material: KeyMaterial,
        /// Read key and IV from their files instead of generating new ones.
        #[arg(long, default_value_t = false)]
        reuse: bool,
        /// Optional RNG seed for reproducible key and IV generation.
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        trace: TraceArgs,
    },
    /// Decrypt a ciphertext file with a stored key and IV.
    Decrypt {
        /// Ciphertext file.
        #[arg(long, value_name = "FILE", default_value = "ciphertext.bin")]
        input: PathBuf,
        /// Plaintext output path.
        #[arg(long, value_name = "FILE", default_value = "decrypted_output.txt")]
        output: PathBuf,
        #[command(flatten)]
        material: KeyMaterial,
        /// Decryption worker threads (defaults to available parallelism).
        #[arg(long)]
        threads: Option<usize>,
        #[command(flatten)]
        trace: TraceArgs,
    },
    /// Generate a random key and IV and store them as raw 16-byte files.
    Keygen {
        /// Key output path.
        #[arg(long, value_name = "FILE", default_value = "key.bin")]
        key: PathBuf,
        /// IV output path.
        #[arg(long, value_name = "FILE", default_value = "iv.bin")]
        iv: PathBuf,
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run a local demo: random key, IV and message, traced encryption, decryption back.
    Demo {
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
        /// Message length in bytes.
        #[arg(long, default_value_t = 20)]
        len: usize,
    },
}

/// Where the key and IV come from.
#[derive(Args)]
struct KeyMaterial {
    /// Key file (raw 16 bytes).
    #[arg(long, value_name = "FILE", default_value = "key.bin")]
    key: PathBuf,
    /// IV file (raw 16 bytes).
    #[arg(long, value_name = "FILE", default_value = "iv.bin")]
    iv: PathBuf,
    /// Key as 32 hex characters; takes precedence over the key file.
    #[arg(long, value_name = "HEX")]
    key_hex: Option<String>,
    /// IV as 32 hex characters; takes precedence over the IV file.
    #[arg(long, value_name = "HEX")]
    iv_hex: Option<String>,
}

/// Cipher trace destination.
#[derive(Args)]
struct TraceArgs {
    /// Print every intermediate cipher state to stdout.
    #[arg(long, default_value_t = false, conflicts_with = "trace_file")]
    trace: bool,
    /// Write every intermediate cipher state to a file.
    #[arg(long, value_name = "FILE")]
    trace_file: Option<PathBuf>,
}

type TraceOutput = HexWriter<Box<dyn Write>>;

impl TraceArgs {
    fn open(&self) -> Result<Option<TraceOutput>> {
        let out: Box<dyn Write> = match (&self.trace_file, self.trace) {
            (Some(path), _) => Box::new(BufWriter::new(
                File::create(path).with_context(|| format!("create {}", path.display()))?,
            )),
            (None, true) => Box::new(io::stdout().lock()),
            (None, false) => return Ok(None),
        };
        Ok(Some(HexWriter::new(out)))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Encrypt {
            input,
            text,
            output,
            material,
            reuse,
            seed,
            trace,
        } => {
            let plaintext = match (input, text) {
                (Some(path), _) => {
                    fs::read(&path).with_context(|| format!("read {}", path.display()))?
                }
                (None, Some(text)) => text.into_bytes(),
                (None, None) => bail!("either --input or --text is required"),
            };
            cmd_encrypt(&plaintext, &output, &material, reuse, seed, &trace)
        }
        Commands::Decrypt {
            input,
            output,
            material,
            threads,
            trace,
        } => cmd_decrypt(&input, &output, &material, threads, &trace),
        Commands::Keygen { key, iv, seed } => cmd_keygen(&key, &iv, seed),
        Commands::Demo { seed, len } => cmd_demo(seed, len),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn cmd_encrypt(
    plaintext: &[u8],
    output: &Path,
    material: &KeyMaterial,
    reuse: bool,
    seed: Option<u64>,
    trace: &TraceArgs,
) -> Result<()> {
    if plaintext.is_empty() {
        println!("nothing to encrypt");
        return Ok(());
    }

    let (key, iv) = if reuse || material.key_hex.is_some() || material.iv_hex.is_some() {
        load_material(material)?
    } else {
        let mut rng = seeded_rng(seed);
        let (key, iv) = generate_material(&mut rng);
        write_block(&material.key, &key)
            .with_context(|| format!("write {}", material.key.display()))?;
        write_block(&material.iv, &iv)
            .with_context(|| format!("write {}", material.iv.display()))?;
        println!("generated key: {}", hex::encode(key));
        println!("generated iv:  {}", hex::encode(iv));
        (key, iv)
    };

    let cfb = Cfb128::with_key(&Aes128Key::from(key), iv);
    let mut sink = trace.open()?;
    let ciphertext = cfb.encrypt_traced(plaintext, &mut sink);
    finish_trace(sink);

    fs::write(output, &ciphertext).with_context(|| format!("write {}", output.display()))?;
    println!(
        "wrote {} bytes of ciphertext to {}",
        ciphertext.len(),
        output.display()
    );
    Ok(())
}

fn cmd_decrypt(
    input: &Path,
    output: &Path,
    material: &KeyMaterial,
    threads: Option<usize>,
    trace: &TraceArgs,
) -> Result<()> {
    let (key, iv) = load_material(material)?;
    let ciphertext = fs::read(input).with_context(|| format!("read {}", input.display()))?;
    let cfb = Cfb128::with_key(&Aes128Key::from(key), iv);

    let plaintext = match trace.open()? {
        Some(mut sink) => {
            let plaintext = cfb.decrypt_traced(&ciphertext, &mut sink);
            finish_trace(Some(sink));
            plaintext
        }
        None => {
            let parallelism = match threads {
                Some(n) => Parallelism::new(n).context("--threads must be at least 1")?,
                None => Parallelism::available(),
            };
            debug!(workers = parallelism.get(), "decrypting");
            cfb.decrypt_parallel(&ciphertext, parallelism)
        }
    };

    fs::write(output, &plaintext).with_context(|| format!("write {}", output.display()))?;
    println!(
        "wrote {} bytes of plaintext to {}",
        plaintext.len(),
        output.display()
    );
    println!("decrypted text:\n{}", String::from_utf8_lossy(&plaintext));
    Ok(())
}

fn cmd_keygen(key_path: &Path, iv_path: &Path, seed: Option<u64>) -> Result<()> {
    let mut rng = seeded_rng(seed);
    let (key, iv) = generate_material(&mut rng);
    write_block(key_path, &key).with_context(|| format!("write {}", key_path.display()))?;
    write_block(iv_path, &iv).with_context(|| format!("write {}", iv_path.display()))?;
    println!("key: {}", hex::encode(key));
    println!("iv:  {}", hex::encode(iv));
    Ok(())
}

fn cmd_demo(seed: Option<u64>, len: usize) -> Result<()> {
    let mut rng = seeded_rng(seed);
    let (key, iv) = generate_material(&mut rng);
    let mut message = vec![0u8; len];
    rng.fill_bytes(&mut message);

    let cfb = Cfb128::with_key(&Aes128Key::from(key), iv);
    let mut sink = Some(HexWriter::new(Box::new(io::stdout().lock()) as Box<dyn Write>));
    let ciphertext = cfb.encrypt_traced(&message, &mut sink);
    finish_trace(sink);
    let decrypted = cfb.decrypt(&ciphertext);

    println!();
    println!("demo key:   {}", hex::encode(key));
    println!("demo iv:    {}", hex::encode(iv));
    println!("plaintext:  {}", hex::encode(&message));
    println!("ciphertext: {}", hex::encode(&ciphertext));
    println!("decrypted:  {}", hex::encode(&decrypted));
    if decrypted != message {
        bail!("demo roundtrip failed");
    }
    Ok(())
}

/// Flushes the trace writer; trace problems are reported but never fail the run.
fn finish_trace(sink: Option<TraceOutput>) {
    let Some(mut sink) = sink else {
        return;
    };
    let err = sink.take_error();
    let flushed = sink.into_inner().flush();
    if let Some(err) = err.or(flushed.err()) {
        warn!(error = %err, "cipher trace is incomplete");
    }
}

fn load_material(material: &KeyMaterial) -> Result<(Block, Block)> {
    let key = match &material.key_hex {
        Some(hex_str) => parse_hex_block(hex_str, "key")?,
        None => read_block(&material.key, "key")?,
    };
    let iv = match &material.iv_hex {
        Some(hex_str) => parse_hex_block(hex_str, "IV")?,
        None => read_block(&material.iv, "IV")?,
    };
    Ok((key, iv))
}

fn generate_material(rng: &mut impl RngCore) -> (Block, Block) {
    let mut key = [0u8; 16];
    let mut iv = [0u8; 16];
    rng.fill_bytes(&mut key);
    rng.fill_bytes(&mut iv);
    (key, iv)
}

fn parse_hex_block(hex_str: &str, what: &str) -> Result<Block> {
    let bytes = hex::decode(hex_str.trim()).with_context(|| format!("decode {what} hex"))?;
    if bytes.len() != 16 {
        bail!("{what} must be 16 bytes (32 hex characters), got {}", bytes.len());
    }
    let mut block = [0u8; 16];
    block.copy_from_slice(&bytes);
    Ok(block)
}

fn seeded_rng(seed: Option<u64>) -> impl RngCore + CryptoRng {
    match seed {
        Some(value) => {
            let mut seed_bytes = [0u8; 32];
            seed_bytes[..8].copy_from_slice(&value.to_le_bytes());
            ChaCha20Rng::from_seed(seed_bytes)
        }
        None => {
            let mut seed_bytes = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut seed_bytes);
            ChaCha20Rng::from_seed(seed_bytes)
        }
    }
}
