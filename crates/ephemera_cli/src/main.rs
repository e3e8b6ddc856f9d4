//! Command-line client for the Ephemera API.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use ephemera_core::DEFAULT_CLI_SERVER_URL;
use serde_json::Value;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};


#[derive(Parser)]
#[command(name = "eph", about = "Ephemera CLI", version)]
struct Cli {
    /// Server URL (can also be set via EPHEMERA_SERVER env var)
    #[arg(short, long, env = "EPHEMERA_SERVER")]
    server: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Print timing for API requests
    #[arg(long, global = true)]
    timing: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Upload an existing path, or paste the text (stdin when omitted)
    Share {
        target: Option<String>,
        /// Lifetime such as 30m, 2h or 1d
        #[arg(long)]
        ttl: Option<String>,
    },
    /// Upload a file
    Upload {
        path: PathBuf,
        #[arg(long)]
        ttl: Option<String>,
        /// Refuse downloads after this many
        #[arg(long)]
        max_downloads: Option<i64>,
    },
    /// Create a paste from a file or stdin
    Paste {
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(short, long)]
        language: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        ttl: Option<String>,
        /// Refuse views after this many
        #[arg(long)]
        max_views: Option<i64>,
    },
    /// Print a paste (counts one view)
    Get { id: String },
    /// Print raw paste content (counts one view)
    Raw { id: String },
    /// Download a file (counts one download)
    Download {
        id: String,
        /// Destination path, or `-` for stdout; defaults to the served file name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show file metadata
    Info { id: String },
    /// Delete a paste or file
    Delete { id: String },
}

#[derive(Debug, PartialEq, Eq)]
enum ShareTarget {
    File(PathBuf),
    Text(String),
    Stdin,
}

fn share_target(target: Option<String>) -> ShareTarget {
    match target {
        Some(value) if Path::new(&value).is_file() => ShareTarget::File(PathBuf::from(value)),
        Some(value) => ShareTarget::Text(value),
        None => ShareTarget::Stdin,
    }
}

fn log_timing(timing: bool, label: &str, duration: Duration) {
    if timing {
        eprintln!(
            "[timing] {}: {:.1} ms",
            label,
            duration.as_secs_f64() * 1000.0
        );
    }
}

fn error_message_for_response(status: reqwest::StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}

async fn ensure_success_or_exit(res: reqwest::Response, action: &str) -> reqwest::Response {
    let status = res.status();
    if status.is_success() {
        return res;
    }

    let body = match res.text().await {
        Ok(body) => body,
        Err(err) => format!("failed to read error response body: {}", err),
    };
    let message = error_message_for_response(status, &body);
    eprintln!("{} failed ({}): {}", action, status, message);
    std::process::exit(1);
}

fn api_url(server: &str, segments: &[&str]) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(server)
        .map_err(|err| format!("Invalid server URL '{}': {}", server, err))?;
    let mut path = url
        .path_segments_mut()
        .map_err(|_| "Server URL cannot be used as an API base".to_string())?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment);
    }
    drop(path);
    Ok(url)
}

fn api_url_or_exit(server: &str, action: &str, segments: &[&str]) -> reqwest::Url {
    match api_url(server, segments) {
        Ok(url) => url,
        Err(message) => {
            eprintln!("{} failed: {}", action, message);
            std::process::exit(1);
        }
    }
}

fn normalize_server(server: String) -> String {
    if let Ok(mut url) = reqwest::Url::parse(&server) {
        let should_normalize_localhost =
            url.scheme().eq_ignore_ascii_case("http") && url.host_str() == Some("localhost");
        if should_normalize_localhost && url.set_host(Some("127.0.0.1")).is_err() {
            return server;
        }
        let mut normalized = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }
        return normalized;
    }
    server
}

fn resolve_server(server: Option<String>) -> String {
    server
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CLI_SERVER_URL.to_string())
}

/// File name from an `attachment; filename="..."` header, reduced to its
/// final path component.
fn attachment_file_name(header: &str) -> Option<String> {
    let (_, rest) = header.split_once("filename=")?;
    let name = rest.split(';').next()?.trim().trim_matches('"');
    let name = name.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

fn field<'a>(value: &'a Value, key: &str) -> Result<&'a str, String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("response missing '{}' field", key))
}

fn format_pretty(value: &Value) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("response encoding error: {}", err))
}

fn format_upload_output(server: &str, file: &Value, json: bool) -> Result<String, String> {
    if json {
        return format_pretty(file);
    }
    Ok(format!(
        "Uploaded: {} ({})\n{}{}",
        field(file, "original_name")?,
        field(file, "id")?,
        server,
        field(file, "download")?
    ))
}

fn format_paste_created_output(server: &str, paste: &Value, json: bool) -> Result<String, String> {
    if json {
        return format_pretty(paste);
    }
    Ok(format!(
        "Created: {} [{}]\n{}{}",
        field(paste, "id")?,
        field(paste, "language")?,
        server,
        field(paste, "raw")?
    ))
}

fn format_get_output(paste: &Value, json: bool) -> Result<String, String> {
    if json {
        return format_pretty(paste);
    }
    field(paste, "content").map(str::to_string)
}

fn format_info_output(file: &Value, json: bool) -> Result<String, String> {
    if json {
        return format_pretty(file);
    }
    let limit = match file.get("max_downloads").and_then(Value::as_i64) {
        Some(limit) if limit >= 0 => limit.to_string(),
        _ => "unlimited".to_string(),
    };
    Ok(format!(
        "{}\n  size:      {} bytes\n  type:      {}\n  downloads: {} / {}\n  expires:   {}",
        field(file, "original_name")?,
        file.get("size").and_then(Value::as_u64).unwrap_or(0),
        field(file, "content_type")?,
        file.get("downloads").and_then(Value::as_u64).unwrap_or(0),
        limit,
        field(file, "expires_at")?
    ))
}

fn exit_on_format_error(action: &str, output: Result<String, String>) -> String {
    match output {
        Ok(output) => output,
        Err(message) => {
            eprintln!("{} failed: {}", action, message);
            std::process::exit(1);
        }
    }
}

fn read_stdin() -> io::Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

struct Session {
    client: reqwest::Client,
    server: String,
    json: bool,
    timing: bool,
}

impl Session {
    async fn upload(
        &self,
        path: &Path,
        ttl: Option<String>,
        max_downloads: Option<i64>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let endpoint = api_url_or_exit(&self.server, "Upload", &["api", "file"]);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let data = std::fs::read(path)?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(data).file_name(file_name));
        if let Some(ttl) = ttl {
            form = form.text("ttl", ttl);
        }
        if let Some(limit) = max_downloads {
            form = form.text("max_downloads", limit.to_string());
        }

        let request_start = Instant::now();
        let res = self.client.post(endpoint).multipart(form).send().await?;
        log_timing(self.timing, "upload", request_start.elapsed());
        let res = ensure_success_or_exit(res, "Upload").await;
        let file: Value = res.json().await?;
        println!(
            "{}",
            exit_on_format_error("Upload", format_upload_output(&self.server, &file, self.json))
        );
        Ok(())
    }

    async fn paste(&self, body: Value) -> Result<(), Box<dyn std::error::Error>> {
        let endpoint = api_url_or_exit(&self.server, "Paste", &["api", "paste"]);
        let request_start = Instant::now();
        let res = self.client.post(endpoint).json(&body).send().await?;
        log_timing(self.timing, "paste", request_start.elapsed());
        let res = ensure_success_or_exit(res, "Paste").await;
        let paste: Value = res.json().await?;
        println!(
            "{}",
            exit_on_format_error(
                "Paste",
                format_paste_created_output(&self.server, &paste, self.json)
            )
        );
        Ok(())
    }

    async fn get_json(
        &self,
        action: &str,
        segments: &[&str],
    ) -> Result<Value, Box<dyn std::error::Error>> {
        let endpoint = api_url_or_exit(&self.server, action, segments);
        let request_start = Instant::now();
        let res = self.client.get(endpoint).send().await?;
        log_timing(self.timing, action, request_start.elapsed());
        let res = ensure_success_or_exit(res, action).await;
        Ok(res.json().await?)
    }

    async fn raw(&self, id: &str) -> Result<(), Box<dyn std::error::Error>> {
        let endpoint = api_url_or_exit(&self.server, "Raw", &["api", "paste", id, "raw"]);
        let request_start = Instant::now();
        let res = self.client.get(endpoint).send().await?;
        log_timing(self.timing, "raw", request_start.elapsed());
        let res = ensure_success_or_exit(res, "Raw").await;
        print!("{}", res.text().await?);
        io::stdout().flush()?;
        Ok(())
    }

    async fn download(
        &self,
        id: &str,
        output: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let endpoint = api_url_or_exit(&self.server, "Download", &["api", "file", id]);
        let request_start = Instant::now();
        let res = self.client.get(endpoint).send().await?;
        let mut res = ensure_success_or_exit(res, "Download").await;

        let served_name = res
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_file_name);
        let destination = output
            .unwrap_or_else(|| PathBuf::from(served_name.unwrap_or_else(|| id.to_string())));

        let mut written = 0u64;
        if destination.as_os_str() == "-" {
            let mut stdout = io::stdout().lock();
            while let Some(chunk) = res.chunk().await? {
                stdout.write_all(&chunk)?;
                written += chunk.len() as u64;
            }
            stdout.flush()?;
        } else {
            let mut file = std::fs::File::create(&destination)?;
            while let Some(chunk) = res.chunk().await? {
                file.write_all(&chunk)?;
                written += chunk.len() as u64;
            }
            file.sync_all()?;
            if self.json {
                println!(
                    "{}",
                    serde_json::json!({ "id": id, "path": destination, "bytes": written })
                );
            } else {
                println!("Saved {} ({} bytes)", destination.display(), written);
            }
        }
        log_timing(self.timing, "download", request_start.elapsed());
        Ok(())
    }

    /// Pastes and files share one id space; try the paste first.
    async fn delete(&self, id: &str) -> Result<(), Box<dyn std::error::Error>> {
        for kind in ["paste", "file"] {
            let endpoint = api_url_or_exit(&self.server, "Delete", &["api", kind, id]);
            let res = self.client.delete(endpoint).send().await?;
            if res.status() == reqwest::StatusCode::NOT_FOUND {
                continue;
            }
            ensure_success_or_exit(res, "Delete").await;
            if self.json {
                println!("{}", serde_json::json!({ "id": id, "kind": kind, "deleted": true }));
            } else {
                println!("Deleted {}: {}", kind, id);
            }
            return Ok(());
        }
        eprintln!("Delete failed (404 Not Found): no paste or file with id {}", id);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        server,
        json,
        timing,
        timeout,
        command,
    } = Cli::parse();

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()?;
    let session = Session {
        client,
        server: normalize_server(resolve_server(server)),
        json,
        timing,
    };

    match command {
        Commands::Completions { .. } => unreachable!("completions handled before client setup"),
        Commands::Share { target, ttl } => match share_target(target) {
            ShareTarget::File(path) => session.upload(&path, ttl, None).await?,
            ShareTarget::Text(content) => {
                session
                    .paste(serde_json::json!({ "content": content, "ttl": ttl }))
                    .await?
            }
            ShareTarget::Stdin => {
                if io::stdin().is_terminal() {
                    eprintln!("Share failed: pass a path or text, or pipe content on stdin");
                    std::process::exit(1);
                }
                let content = read_stdin()?;
                session
                    .paste(serde_json::json!({ "content": content, "ttl": ttl }))
                    .await?
            }
        },
        Commands::Upload {
            path,
            ttl,
            max_downloads,
        } => session.upload(&path, ttl, max_downloads).await?,
        Commands::Paste {
            file,
            language,
            title,
            ttl,
            max_views,
        } => {
            let content = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => read_stdin()?,
            };
            session
                .paste(serde_json::json!({
                    "content": content,
                    "language": language,
                    "title": title,
                    "ttl": ttl,
                    "max_views": max_views,
                }))
                .await?
        }
        Commands::Get { id } => {
            let paste = session.get_json("Get", &["api", "paste", id.as_str()]).await?;
            println!("{}", exit_on_format_error("Get", format_get_output(&paste, json)));
        }
        Commands::Raw { id } => session.raw(&id).await?,
        Commands::Download { id, output } => session.download(&id, output).await?,
        Commands::Info { id } => {
            let file = session
                .get_json("Info", &["api", "file", id.as_str(), "info"])
                .await?;
            println!("{}", exit_on_format_error("Info", format_info_output(&file, json)));
        }
        Commands::Delete { id } => session.delete(&id).await?,
    }

    Ok(())
}
