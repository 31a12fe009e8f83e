//! Artifact signing utility.
//!
//! `keygen` creates an Ed25519 signing seed; `sign` hashes the transformer
//! and classifier files into `manifest.json` and writes the raw signature to
//! `manifest.sig`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sign_artifacts -- keygen --out-seed <path> [--out-pub <path>] [--force]
//! cargo run --bin sign_artifacts -- sign <artifact_dir>
//! ```
//!
//! The seed for `sign` is read from the file named by
//! `SOMNOLENS_SIGNING_KEY_B64_FILE` (or, in debug builds only, from
//! `SOMNOLENS_SIGNING_KEY_B64`). Artifact file names follow the same
//! `SOMNOLENS_*_FILE` variables as the main binary.

use std::env;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use somnolens::adapters::artifacts::manifest::{ArtifactManifest, MANIFEST_FILE, SIGNATURE_FILE};
use somnolens::Config;

const KEY_FILE_ENV: &str = "SOMNOLENS_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "SOMNOLENS_SIGNING_KEY_B64";

const USAGE: &str = "Usage: sign_artifacts keygen --out-seed <path> [--out-pub <path>] [--force]\n       sign_artifacts sign <artifact_dir>";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn read_signing_seed_b64() -> Result<Zeroizing<String>, String> {
    if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = fs::read_to_string(path.trim())
            .map_err(|e| format!("Failed reading signing key file: {e}"))?;
        let secret = content.trim_end_matches(['\n', '\r']).to_string();
        if secret.is_empty() {
            return Err("Empty signing key".to_string());
        }
        return Ok(Zeroizing::new(secret));
    }

    // Dev-only fallback.
    if cfg!(debug_assertions) {
        if let Ok(v) = env::var(KEY_ENV) {
            let secret = v.trim_end_matches(['\n', '\r']).to_string();
            if secret.is_empty() {
                return Err("Empty signing key".to_string());
            }
            return Ok(Zeroizing::new(secret));
        }
    }

    Err(format!(
        "Missing signing key. Set {KEY_FILE_ENV} ({KEY_ENV} is accepted only in debug builds)."
    ))
}

fn read_signing_seed() -> Result<Seed, String> {
    let v = read_signing_seed_b64()?;
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(v.trim())
            .map_err(|e| format!("Invalid base64 in signing key: {e}"))?,
    );
    if raw.len() != 32 {
        return Err(format!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        ));
    }
    let mut seed = Seed([0u8; 32]);
    seed.0.copy_from_slice(&raw);
    Ok(seed)
}

fn write_file(path: &Path, contents: &[u8], mode: u32, force: bool) -> Result<(), String> {
    if path.exists() && !force {
        return Err(format!("Refusing to overwrite existing file {path:?}. Use --force."));
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

    let mut file = opts
        .open(path)
        .map_err(|e| format!("Failed to open {path:?}: {e}"))?;
    file.write_all(contents)
        .map_err(|e| format!("Failed to write {path:?}: {e}"))
}

fn keygen(mut args: impl Iterator<Item = String>) -> Result<(), String> {
    let mut out_seed: Option<PathBuf> = None;
    let mut out_pub: Option<PathBuf> = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out-seed" => out_seed = Some(args.next().ok_or(USAGE)?.into()),
            "--out-pub" => out_pub = Some(args.next().ok_or(USAGE)?.into()),
            "--force" => force = true,
            _ => return Err(format!("Unknown arg: {arg}\n{USAGE}")),
        }
    }
    let out_seed = out_seed.ok_or(USAGE)?;

    let mut seed = Seed([0u8; 32]);
    OsRng.fill_bytes(&mut seed.0);
    let verifying_key = SigningKey::from_bytes(&seed.0).verifying_key();

    let mut seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed.0));
    seed_b64.push('\n');
    write_file(&out_seed, seed_b64.as_bytes(), 0o600, force)?;

    let pub_b64 = general_purpose::STANDARD.encode(verifying_key.as_bytes());
    if let Some(path) = &out_pub {
        // Public key is non-secret; allow read access.
        write_file(path, format!("{pub_b64}\n").as_bytes(), 0o644, force)?;
    }

    // Print only non-secret material.
    println!("Wrote signing seed (base64) to {out_seed:?}");
    if let Some(path) = &out_pub {
        println!("Wrote public key (base64) to {path:?}");
    }
    println!("SOMNOLENS_ARTIFACT_PUBKEY_B64={pub_b64}");
    println!("PUBKEY (hex)={}", to_hex(verifying_key.as_bytes()));
    Ok(())
}

fn sign(mut args: impl Iterator<Item = String>) -> Result<(), String> {
    let dir = PathBuf::from(args.next().ok_or(USAGE)?);
    if args.next().is_some() {
        return Err(USAGE.to_string());
    }

    let config = Config::from_env().map_err(|e| e.to_string())?;
    let names = [config.transformer_file.as_str(), config.classifier_file.as_str()];

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let manifest = ArtifactManifest::for_files(&dir, &names)
        .map_err(|e| format!("Failed to hash artifacts in {dir:?}: {e}"))?;
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| format!("Failed to serialize {MANIFEST_FILE}: {e}"))?;

    let manifest_path = dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .map_err(|e| format!("Failed to write {manifest_path:?}: {e}"))?;

    let sig_path = dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, signing_key.sign(&manifest_bytes).to_bytes())
        .map_err(|e| format!("Failed to write {sig_path:?}: {e}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "PUBKEY (base64)={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn main() -> Result<(), String> {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("keygen") => keygen(args),
        Some("sign") => sign(args),
        Some("-h" | "--help") => {
            println!("{USAGE}");
            Ok(())
        }
        _ => Err(USAGE.to_string()),
    }
}
