//! Render a stored QR code to a file

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::RecordService;
use crate::services::qr::AssetFormat;
use crate::services::safety::NoopSafetyCheck;
use crate::storage::StorageFactory;

pub async fn qr_render(
    slug: String,
    format: AssetFormat,
    size: u32,
    output: Option<String>,
) -> Result<(), CliError> {
    let storage = StorageFactory::create().await?;
    // 只读渲染，不需要 URL 安全检查
    let service = RecordService::new(storage, std::sync::Arc::new(NoopSafetyCheck));

    let asset = service
        .render_qr_asset(&slug, format, size, None)
        .await?
        .ok_or_else(|| CliError::CommandError(format!("QR code '{}' not found", slug)))?;

    let path = output.unwrap_or_else(|| asset.filename.clone());
    std::fs::write(&path, &asset.bytes)?;

    println!(
        "{} {} ({} bytes)",
        "QR code written to".green(),
        path.blue(),
        asset.bytes.len()
    );
    Ok(())
}
