//! One-time startup provisioning: create the assistant, create a vector
//! store, upload the reference files into it, and bind the store to the
//! assistant's file-search tool.

use std::path::{Path, PathBuf};

use {
    reqwest::multipart::{Form, Part},
    serde::Deserialize,
    tracing::{debug, error, info, warn},
};

use {
    crate::{
        client::AssistantClient,
        dispatch::SessionIds,
        error::{Error, Result},
    },
    ragbridge_config::AssistantConfig,
};

/// Any create endpoint's response; we only need the id.
#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

/// Outcome of uploading a directory into a vector store.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    /// File ids attached to the store, in upload order.
    pub attached: Vec<String>,
    /// Files that failed to upload or attach.
    pub failed: Vec<PathBuf>,
}

/// Create the assistant described by `config`.
pub async fn create_assistant(client: &AssistantClient, config: &AssistantConfig) -> Result<String> {
    let tools: Vec<serde_json::Value> = config
        .tools
        .iter()
        .map(|t| serde_json::json!({ "type": t }))
        .collect();
    let body = serde_json::json!({
        "name": config.name,
        "instructions": config.instructions,
        "model": config.model,
        "tools": tools,
    });
    debug!(model = %config.model, tools = ?config.tools, "creating assistant");
    let created: Created = client
        .send_json(client.post("assistants").json(&body))
        .await?;
    info!(assistant_id = %created.id, "assistant created");
    Ok(created.id)
}

/// Create an empty vector store.
pub async fn create_vector_store(client: &AssistantClient, name: &str) -> Result<String> {
    let body = serde_json::json!({ "name": name });
    let created: Created = client
        .send_json(client.post("vector_stores").json(&body))
        .await?;
    info!(vector_store_id = %created.id, "vector store created");
    Ok(created.id)
}

/// Upload a local file with `purpose=assistants` and return its file id.
pub async fn upload_file(client: &AssistantClient, path: &Path) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::message(format!("invalid file name: {}", path.display())))?
        .to_string();
    let data = tokio::fs::read(path).await?;
    debug!(file_name, bytes = data.len(), "uploading file");

    let form = Form::new()
        .text("purpose", "assistants")
        .part("file", Part::bytes(data).file_name(file_name));
    let created: Created = client
        .send_json(client.post("files").multipart(form))
        .await?;
    Ok(created.id)
}

/// Attach an uploaded file to a vector store.
pub async fn attach_file(
    client: &AssistantClient,
    vector_store_id: &str,
    file_id: &str,
) -> Result<()> {
    let body = serde_json::json!({ "file_id": file_id });
    let _: serde_json::Value = client
        .send_json(
            client
                .post(&format!("vector_stores/{vector_store_id}/files"))
                .json(&body),
        )
        .await?;
    debug!(vector_store_id, file_id, "file attached to vector store");
    Ok(())
}

/// Bind `vector_store_id` as the file-search resource of the assistant.
pub async fn attach_vector_store(
    client: &AssistantClient,
    assistant_id: &str,
    vector_store_id: &str,
) -> Result<()> {
    let body = serde_json::json!({
        "tool_resources": {
            "file_search": { "vector_store_ids": [vector_store_id] },
        },
    });
    let _: serde_json::Value = client
        .send_json(client.post(&format!("assistants/{assistant_id}")).json(&body))
        .await?;
    info!(assistant_id, vector_store_id, "assistant bound to vector store");
    Ok(())
}

/// Regular files directly inside `dir`, sorted by name. Subdirectories are
/// not descended into.
async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Upload every file in `dir` and attach it to the store.
///
/// A failure on one file is logged and the file skipped; a missing or
/// unreadable directory fails the whole call.
pub async fn upload_directory(
    client: &AssistantClient,
    vector_store_id: &str,
    dir: &Path,
) -> Result<UploadSummary> {
    let mut summary = UploadSummary::default();
    for path in list_files(dir).await? {
        let attached = async {
            let file_id = upload_file(client, &path).await?;
            attach_file(client, vector_store_id, &file_id).await?;
            Ok::<_, Error>(file_id)
        }
        .await;
        match attached {
            Ok(file_id) => summary.attached.push(file_id),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                summary.failed.push(path);
            },
        }
    }
    info!(
        vector_store_id,
        attached = summary.attached.len(),
        failed = summary.failed.len(),
        "reference files uploaded"
    );
    Ok(summary)
}

/// Establish the session identifiers used by every query.
///
/// Reuses configured ids when both are present; otherwise runs the full
/// create/upload/bind sequence. Any failure other than a single file upload
/// aborts, including a missing files directory.
pub async fn provision(client: &AssistantClient, config: &AssistantConfig) -> Result<SessionIds> {
    if config.has_existing_resources() {
        let session = SessionIds::new(
            config.assistant_id.clone().unwrap_or_default(),
            config.vector_store_id.clone().unwrap_or_default(),
        )?;
        info!(
            assistant_id = %session.assistant_id,
            vector_store_id = %session.vector_store_id,
            "reusing configured assistant resources"
        );
        return Ok(session);
    }

    let assistant_id = create_assistant(client, config).await?;
    let vector_store_id = create_vector_store(client, &format!("{} files", config.name)).await?;

    upload_directory(client, &vector_store_id, &config.files_path)
        .await
        .inspect_err(|e| {
            error!(
                path = %config.files_path.display(),
                error = %e,
                "cannot read reference files directory"
            );
        })?;

    attach_vector_store(client, &assistant_id, &vector_store_id).await?;
    SessionIds::new(assistant_id, vector_store_id)
}
