//! Compose manifest patching — pure tree transformation.
//!
//! The manifest is handled as a generic `serde_yaml::Value` so every field
//! the agent does not understand round-trips unchanged. Only string-form
//! volume entries under `services.<name>.volumes` are ever touched.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

/// One bind-mount host path substitution performed by [`patch_volumes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRewrite {
    /// Service whose volume list contained the entry.
    pub service: String,
    /// Host path as written in the tracked manifest.
    pub from: String,
    /// Host path after substitution.
    pub to: String,
}

/// Rewrite every string-form bind mount whose host side starts with
/// `internal_prefix`, substituting the prefix with `host_data_path`.
///
/// The container-side path and any mount options after the first `:` are
/// preserved verbatim. Non-string volume entries (named-volume maps) and
/// entries with no `:` separator pass through unmodified. Returns the list
/// of substitutions for logging.
pub fn patch_volumes(
    doc: &mut Value,
    internal_prefix: &str,
    host_data_path: &str,
) -> Vec<VolumeRewrite> {
    let mut rewrites = Vec::new();

    let Some(services) = doc.get_mut("services").and_then(Value::as_mapping_mut) else {
        return rewrites;
    };

    for (name, service) in services.iter_mut() {
        let service_name = name.as_str().unwrap_or_default().to_string();
        let Some(volumes) = service.get_mut("volumes").and_then(Value::as_sequence_mut) else {
            continue;
        };

        for volume in volumes.iter_mut() {
            let Some(spec) = volume.as_str() else {
                continue;
            };
            let Some((host, rest)) = spec.split_once(':') else {
                continue;
            };
            let Some(suffix) = host.strip_prefix(internal_prefix) else {
                continue;
            };

            let real_host = format!("{host_data_path}{suffix}");
            rewrites.push(VolumeRewrite {
                service: service_name.clone(),
                from: host.to_string(),
                to: real_host.clone(),
            });
            *volume = Value::String(format!("{real_host}:{rest}"));
        }
    }

    rewrites
}

/// Derived sibling path for the patched manifest.
///
/// The tracked original is never overwritten; every cycle patches from the
/// pristine file. `docker-compose.yaml` becomes `docker-compose.patched.yaml`.
#[must_use]
pub fn patched_path(manifest: &Path) -> PathBuf {
    let stem = manifest
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("manifest");
    let ext = manifest
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");
    manifest.with_file_name(format!("{stem}.patched.{ext}"))
}

// ── Unit tests ────────────────────────────────────────────────────────────────
