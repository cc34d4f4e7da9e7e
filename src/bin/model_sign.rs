//! Signing utility for Colorisk classifier artifacts.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin model_sign -- keygen --out-seed <path> [--out-pub <path>] [--force]
//! cargo run --bin model_sign -- sign <model_dir> [--serial <u64>]
//! ```
//!
//! `keygen` writes a base64 Ed25519 seed (0600 on Unix) and optionally the
//! base64 public key that the app reads from `COLORISK_MODEL_PUBKEY_B64_FILE`.
//! `sign` hashes `classifier.json` into `manifest.json` and signs it into
//! `model.sig`. Seeds are zeroized after use; only public material is printed.

use std::env;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use colorisk::adapters::model::{manifest, MODEL_FILE};

const KEY_FILE_ENV: &str = "COLORISK_MODEL_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "COLORISK_MODEL_SIGNING_KEY_B64";
const DOCKER_SECRET_PATH: &str = "/run/secrets/colorisk_model_signing_key_b64";

const USAGE: &str = "Usage:
  model_sign keygen --out-seed <path> [--out-pub <path>] [--force]
  model_sign sign <model_dir> [--serial <u64>]";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn non_empty_secret(raw: &str) -> Result<Zeroizing<String>> {
    let secret = raw.trim_end_matches(['\n', '\r']).to_string();
    if secret.is_empty() {
        bail!("Empty signing key");
    }
    Ok(Zeroizing::new(secret))
}

fn read_signing_seed_b64() -> Result<Zeroizing<String>> {
    if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = Zeroizing::new(
            fs::read_to_string(path.trim()).context("Failed reading signing key file")?,
        );
        return non_empty_secret(&content);
    }

    if Path::new(DOCKER_SECRET_PATH).exists() {
        let content = Zeroizing::new(
            fs::read_to_string(DOCKER_SECRET_PATH).context("Failed reading docker secret")?,
        );
        return non_empty_secret(&content);
    }

    // Dev-only fallback for convenience.
    if cfg!(debug_assertions) {
        if let Ok(v) = env::var(KEY_ENV) {
            return non_empty_secret(&Zeroizing::new(v));
        }
    }

    Err(anyhow!(
        "Missing signing key. Provide {KEY_FILE_ENV} or {DOCKER_SECRET_PATH} ({KEY_ENV} only in debug builds)."
    ))
}

fn read_signing_seed() -> Result<Seed> {
    let b64 = read_signing_seed_b64()?;
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.trim())
            .context("Invalid base64 in signing key")?,
    );

    if raw.len() != 32 {
        bail!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        );
    }

    let mut seed = Seed([0u8; 32]);
    seed.0.copy_from_slice(&raw);
    Ok(seed)
}

fn open_new(path: &Path, mode: u32, force: bool) -> Result<fs::File> {
    if path.exists() && !force {
        bail!("Refusing to overwrite existing file {path:?}. Use --force.");
    }
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        opts.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    opts.open(path).with_context(|| format!("Failed to open {path:?}"))
}

fn keygen(args: &[String]) -> Result<()> {
    let mut out_seed: Option<PathBuf> = None;
    let mut out_pub: Option<PathBuf> = None;
    let mut force = false;

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--out-seed" => out_seed = Some(PathBuf::from(it.next().ok_or_else(|| anyhow!(USAGE))?)),
            "--out-pub" => out_pub = Some(PathBuf::from(it.next().ok_or_else(|| anyhow!(USAGE))?)),
            "--force" => force = true,
            other => bail!("Unknown arg: {other}\n{USAGE}"),
        }
    }
    let out_seed = out_seed.ok_or_else(|| anyhow!(USAGE))?;

    let mut seed = Seed([0u8; 32]);
    OsRng.fill_bytes(&mut seed.0);
    let verifying_key = SigningKey::from_bytes(&seed.0).verifying_key();
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed.0));
    seed.zeroize();

    // Check both targets before writing either.
    if let Some(pub_path) = &out_pub {
        if pub_path.exists() && !force {
            bail!("Refusing to overwrite existing file {pub_path:?}. Use --force.");
        }
    }

    let mut file = open_new(&out_seed, 0o600, force)?;
    file.write_all(seed_b64.as_bytes())?;
    file.write_all(b"\n")?;
    println!("Wrote signing seed (base64) to {out_seed:?}");

    if let Some(pub_path) = &out_pub {
        // Public key is non-secret; allow read access.
        let mut file = open_new(pub_path, 0o644, force)?;
        file.write_all(general_purpose::STANDARD.encode(verifying_key.as_bytes()).as_bytes())?;
        file.write_all(b"\n")?;
        println!("Wrote public key (base64) to {pub_path:?}");
    }

    println!("PUBKEY (hex)={}", to_hex(verifying_key.as_bytes()));
    Ok(())
}

fn sign(args: &[String]) -> Result<()> {
    let mut model_dir: Option<PathBuf> = None;
    let mut serial: Option<u64> = None;

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--serial" => {
                let v = it.next().ok_or_else(|| anyhow!(USAGE))?;
                serial = Some(v.trim().parse().context("--serial must be a u64")?);
            }
            other if model_dir.is_none() => model_dir = Some(PathBuf::from(other)),
            _ => bail!(USAGE),
        }
    }

    let model_dir = model_dir.ok_or_else(|| anyhow!(USAGE))?;
    let model_dir = if model_dir.is_file() {
        model_dir
            .parent()
            .ok_or_else(|| anyhow!("Model path has no parent directory"))?
            .to_path_buf()
    } else {
        model_dir
    };

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let signed = manifest::sign(&model_dir, &signing_key, &[MODEL_FILE], serial)?;

    println!(
        "Signed {} file(s) in {model_dir:?} (serial {})",
        signed.files.len(),
        signed.serial
    );
    println!(
        "PUBKEY (hex)={}",
        to_hex(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("keygen") => keygen(&args[1..]),
        Some("sign") => sign(&args[1..]),
        Some("-h" | "--help") => {
            println!("{USAGE}");
            Ok(())
        }
        _ => Err(anyhow!(USAGE)),
    }
}
