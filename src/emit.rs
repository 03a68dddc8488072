//! Whole-document JSON IO. Outputs are complete arrays, written next to the
//! target first and renamed into place, so a failed run leaves the previous
//! file untouched.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tokio::{fs, io::AsyncWriteExt};

use crate::record::Record;
use crate::{info_time, Error, Result};

/// Serializes `items` as one JSON array with four-space indentation.
pub fn to_json_bytes<T: Serialize>(items: &[T]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(items.len() * 128);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    items.serialize(&mut ser)?;
    Ok(buf)
}

pub async fn write_json_array<T: Serialize>(path: impl AsRef<Path>, items: &[T]) -> Result<()> {
    let path = path.as_ref();
    let local_now = Local::now();
    let bytes = to_json_bytes(items)?;

    let tmp = tmp_path(path);
    if let Err(e) = replace_with(&tmp, path, &bytes).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }

    info_time!(local_now, "Wrote {} entries to file: {}", items.len(), path.display());
    Ok(())
}

async fn replace_with(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(tmp, path).await?;
    Ok(())
}

/// Sorts by (id, year) so reruns over the same pages produce the same file.
pub async fn write_records(path: impl AsRef<Path>, mut records: Vec<Record>) -> Result<()> {
    sort_records(&mut records);
    write_json_array(path, &records).await
}

pub fn sort_records(records: &mut [Record]) {
    records.sort_by_cached_key(Record::sort_key);
}

pub async fn read_json_array<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).await?;
    serde_json::from_str(&text).map_err(|e| Error::InputFormat(format!("{}: {e}", path.display())))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
