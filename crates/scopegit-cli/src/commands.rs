use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use scopegit_fs::{FsClient, ReadOptions, ScopedFs};
use scopegit_path::{normalize, resolve, ActiveRootContext, PathTranslator, SharedRootContext};
use scopegit_sdk::{repository_name, SidebarConfig};
use scopegit_status::{classify, lookup, Classification, CLASSIFICATIONS};
use scopegit_store::LocalStorage;
use scopegit_types::StatusTriple;
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let json = matches!(cli.format, OutputFormat::Json);
    match cli.command {
        Command::Normalize(args) => {
            let path = normalize(&args.path);
            emit(json, json!({ "path": path }), || println!("{path}"))
        }
        Command::Resolve(args) => {
            let path = resolve(&args.paths);
            emit(json, json!({ "path": path }), || println!("{path}"))
        }
        Command::UriToPath(args) => cmd_uri_to_path(&config, args, json),
        Command::PathToUri(args) => cmd_path_to_uri(&config, args, json),
        Command::Classify(args) => cmd_classify(args, json),
        Command::RepoName(args) => {
            let name = repository_name(&args.url);
            emit(json, json!({ "url": args.url, "name": name }), || match &name {
                Some(name) => println!("{name}"),
                None => println!("{} no folder name in {}", "!".yellow(), args.url),
            })
        }
        Command::Config => cmd_config(&config, json),
        Command::Ls(args) => cmd_ls(&config, args, json),
        Command::Cat(args) => cmd_cat(&config, args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SidebarConfig> {
    match path {
        Some(path) => SidebarConfig::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(SidebarConfig::default()),
    }
}

fn emit(json: bool, value: serde_json::Value, text: impl FnOnce()) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        text();
    }
    Ok(())
}

fn translator(config: &SidebarConfig) -> PathTranslator {
    PathTranslator::new(&config.translator)
}

fn cmd_uri_to_path(config: &SidebarConfig, args: UriToPathArgs, json: bool) -> anyhow::Result<()> {
    let path = translator(config).uri_to_path(&args.locator)?;
    emit(json, json!({ "locator": args.locator, "path": path }), || {
        println!("{path}")
    })
}

fn cmd_path_to_uri(config: &SidebarConfig, args: PathToUriArgs, json: bool) -> anyhow::Result<()> {
    let ctx = match &args.root {
        Some(root) => ActiveRootContext::with_root(root),
        None => ActiveRootContext::new(),
    };
    let locator = translator(config).path_to_uri(&args.path, &ctx)?;
    emit(
        json,
        json!({ "path": args.path, "root": args.root, "locator": locator.as_str() }),
        || println!("{locator}"),
    )
}

fn cmd_classify(args: ClassifyArgs, json: bool) -> anyhow::Result<()> {
    if args.all || args.triple.is_none() {
        let rows: Vec<_> = CLASSIFICATIONS
            .iter()
            .map(|(triple, c)| json!({ "key": triple.to_string(), "classification": c }))
            .collect();
        return emit(json, json!(rows), || {
            for (triple, c) in CLASSIFICATIONS.iter() {
                print_classification(*triple, c);
            }
        });
    }
    let raw = args.triple.unwrap_or_default();
    let triple: StatusTriple = raw.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let shown = classify(triple);
    emit(
        json,
        json!({ "key": triple.to_string(), "classification": lookup(triple), "shown": shown.is_some() }),
        || match lookup(triple) {
            Some(c) => {
                print_classification(triple, &c);
                if shown.is_none() {
                    println!("  {}", "(hidden from status views)".dimmed());
                }
            }
            None => println!("{} {} is not a known status", "!".yellow(), triple),
        },
    )
}

fn print_classification(triple: StatusTriple, c: &Classification) {
    let list = if c.is_staged {
        "staged".green()
    } else {
        "unstaged".red()
    };
    println!("{}  {:<2}  {:<8}  {}", triple, c.symbol.bold(), list, c.description);
}

fn cmd_config(config: &SidebarConfig, json: bool) -> anyhow::Result<()> {
    let mut shown = config.clone();
    if shown.access_token.is_some() {
        shown.access_token = Some("<redacted>".into());
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        print!("{}", shown.to_toml_string()?);
    }
    Ok(())
}

fn scoped_fs(config: &SidebarConfig, base: PathBuf) -> ScopedFs {
    let translator = Arc::new(translator(config));
    let storage = Arc::new(LocalStorage::new(base, translator.clone()));
    ScopedFs::new(storage, translator, SharedRootContext::new())
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")
}

fn cmd_ls(config: &SidebarConfig, args: LsArgs, json: bool) -> anyhow::Result<()> {
    let fs = scoped_fs(config, args.base);
    let path = normalize(&args.path);
    let entries = runtime()?.block_on(async {
        let mut entries = Vec::new();
        for name in fs.readdir(&path).await? {
            let stats = fs.stat(&format!("{}/{name}", path.trim_end_matches('/'))).await?;
            entries.push((name, stats));
        }
        anyhow::Ok(entries)
    })?;
    let rows: Vec<_> = entries
        .iter()
        .map(|(name, stats)| json!({ "name": name, "stats": stats }))
        .collect();
    emit(json, json!(rows), || {
        for (name, stats) in &entries {
            if stats.is_directory() {
                println!("{:>10}  {}/", "-", name.blue().bold());
            } else {
                println!("{:>10}  {}", stats.size, name);
            }
        }
    })
}

fn cmd_cat(config: &SidebarConfig, args: CatArgs) -> anyhow::Result<()> {
    let fs = scoped_fs(config, args.base);
    let data = runtime()?.block_on(fs.read_file(&args.path, ReadOptions::utf8()))?;
    print!("{}", data.text());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_config_path_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), SidebarConfig::default());
    }

    #[test]
    fn config_file_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_branch = \"main\"").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.default_branch, "main");
        assert_eq!(config.default_remote, "origin");
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/scopegit.toml"))).unwrap_err();
        assert!(err.to_string().contains("loading settings"));
    }

    #[test]
    fn lists_local_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Documents/repo")).unwrap();
        std::fs::write(dir.path().join("Documents/repo/a.txt"), "hello").unwrap();

        let fs = scoped_fs(&SidebarConfig::default(), dir.path().to_path_buf());
        let rt = runtime().unwrap();
        let names = rt.block_on(fs.readdir("/Documents/repo")).unwrap();
        assert_eq!(names, vec!["a.txt"]);
        let data = rt
            .block_on(fs.read_file("/Documents/repo/a.txt", ReadOptions::utf8()))
            .unwrap();
        assert_eq!(data.text(), "hello");
    }
}
