//! Disk commands - storages, folders, files and uploads

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use bitrix_client::disk::{name_data, DiskObject, FileInfo, FolderInfo, StorageInfo};
use bitrix_client::{BitrixClient, FilePayload};
use indicatif::{ProgressBar, ProgressStyle};

use super::parse_filter;
use crate::output::{or_dash, ObjectRow, OutputContext, StorageRow};

/// List storages
pub fn storages(
    client: &BitrixClient,
    filter: &[String],
    start: Option<u64>,
    ctx: &OutputContext,
) -> Result<()> {
    let list = client.disk().storages(parse_filter(filter)?, start)?;
    let rows: Vec<StorageRow> = list
        .result
        .unwrap_or_default()
        .into_iter()
        .map(storage_row)
        .collect();

    ctx.print(&rows);
    ctx.next_page(list.next, list.total);
    Ok(())
}

/// Show one storage
pub fn storage(client: &BitrixClient, id: &str, ctx: &OutputContext) -> Result<()> {
    match client.disk().storage(id)?.result {
        Some(storage) => ctx.print_one(&storage_row(storage)),
        None => ctx.warn(&format!("Storage {} not found", id)),
    }
    Ok(())
}

/// Show one folder
pub fn folder(client: &BitrixClient, id: i64, ctx: &OutputContext) -> Result<()> {
    match client.disk().folder(id)?.result {
        Some(folder) => ctx.print_one(&folder_row(folder)),
        None => ctx.warn(&format!("Folder {} not found", id)),
    }
    Ok(())
}

/// List one page of a folder's contents
pub fn children(
    client: &BitrixClient,
    id: i64,
    filter: &[String],
    start: Option<u64>,
    ctx: &OutputContext,
) -> Result<()> {
    let page = client.disk().children(id, parse_filter(filter)?, start)?;
    let rows: Vec<ObjectRow> = page
        .result
        .unwrap_or_default()
        .into_iter()
        .map(|object| match object {
            DiskObject::File(file) => file_row(file),
            DiskObject::Folder(folder) => folder_row(folder),
        })
        .collect();

    ctx.print(&rows);
    ctx.next_page(page.next, page.total);
    Ok(())
}

/// Create a folder in a storage root
pub fn mkdir(client: &BitrixClient, storage_id: &str, name: &str, ctx: &OutputContext) -> Result<()> {
    let created = client.disk().add_folder(storage_id, name_data(name))?.result;
    report_created(created, ctx);
    Ok(())
}

/// Create a folder inside a folder
pub fn mksubdir(client: &BitrixClient, parent_id: i64, name: &str, ctx: &OutputContext) -> Result<()> {
    let created = client.disk().add_subfolder(parent_id, name_data(name))?.result;
    report_created(created, ctx);
    Ok(())
}

/// Delete a folder tree
pub fn rmtree(client: &BitrixClient, id: i64, ctx: &OutputContext) -> Result<()> {
    match client.disk().delete_tree(id)?.result {
        Some(false) => ctx.error(&format!("Folder {} was not deleted", id)),
        _ => ctx.success(&format!("Deleted folder {}", id)),
    }
    Ok(())
}

/// Show one file
pub fn file(client: &BitrixClient, id: i64, ctx: &OutputContext) -> Result<()> {
    match client.disk().file(id)?.result {
        Some(file) => {
            let url = file.download_url.clone();
            ctx.print_one(&file_row(file));
            ctx.info(&format!("Download: {}", url));
        }
        None => ctx.warn(&format!("File {} not found", id)),
    }
    Ok(())
}

/// Upload a local file into a folder
pub fn upload(
    client: &BitrixClient,
    folder_id: i64,
    path: &Path,
    content_type: Option<&str>,
    ctx: &OutputContext,
) -> Result<()> {
    let mut payload = FilePayload::from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if let Some(content_type) = content_type {
        payload = payload.with_content_type(content_type);
    }
    ctx.info(&format!("Uploading {} ({} bytes)", payload.name, payload.bytes.len()));

    let spinner = if ctx.interactive() {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Requesting upload URL...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = client.disk().upload_file_complete(folder_id, payload);
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    let file = result.context("Upload failed")?;
    ctx.success(&format!("Uploaded {} as file {}", file.name, file.id));
    ctx.print_one(&file_row(file));
    Ok(())
}

fn report_created(folder: Option<FolderInfo>, ctx: &OutputContext) {
    match folder {
        Some(folder) => {
            ctx.success(&format!("Created folder {} ({})", folder.name, folder.id));
            ctx.print_one(&folder_row(folder));
        }
        None => ctx.warn("Server returned no folder record"),
    }
}

fn storage_row(storage: StorageInfo) -> StorageRow {
    StorageRow {
        id: storage.id,
        name: storage.name,
        entity: format!("{}:{}", storage.entity_type, storage.entity_id),
        root_folder: storage.root_object_id,
    }
}

fn folder_row(folder: FolderInfo) -> ObjectRow {
    ObjectRow {
        id: folder.id,
        kind: "folder".to_string(),
        name: folder.name,
        size: "-".to_string(),
        updated: folder.update_time.to_rfc3339(),
    }
}

fn file_row(file: FileInfo) -> ObjectRow {
    ObjectRow {
        id: file.id,
        kind: "file".to_string(),
        name: file.name,
        size: or_dash(file.size),
        updated: file.update_time.to_rfc3339(),
    }
}
