//! Command-line access to a content additional information store.
//!
//! # Responsibility
//! - Resolve configuration (file, env, flags) and open the SQLite store.
//! - Map subcommands onto `AdditionalInfoService` calls and print JSON lines.

use cai_core::db::{open_db, open_db_in_memory};
use cai_core::{
    build_service, core_version, init_logging, ContentId, CoreConfig, InMemoryTaggedCache,
    VersionNo,
};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::Value;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "cai", version = core_version(), about = "Content additional information store")]
struct Cli {
    /// JSON config file; `CAI_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides config and environment).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one record.
    Get {
        content_id: ContentId,
        version_no: VersionNo,
        identifier: String,
    },
    /// Print every record of a content version.
    List {
        content_id: ContentId,
        version_no: VersionNo,
    },
    /// Create or update one record with a JSON value.
    Set {
        content_id: ContentId,
        version_no: VersionNo,
        identifier: String,
        /// JSON value, e.g. '{"en":"Hello"}'.
        value: String,
    },
    /// Delete one record, or the whole version when no identifier is given.
    Delete {
        content_id: ContentId,
        version_no: VersionNo,
        identifier: Option<String>,
    },
    /// Delete every record of the given content items.
    Purge {
        #[arg(required = true)]
        content_ids: Vec<ContentId>,
    },
    /// Copy every record of one version onto another.
    Copy {
        source_content_id: ContentId,
        source_version_no: VersionNo,
        target_content_id: ContentId,
        target_version_no: VersionNo,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = match cli.config.as_deref() {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }
    init_logging(&config.log)?;

    let conn = match config.db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let service = build_service(&conn, InMemoryTaggedCache::new(), &config.cache);

    match cli.command {
        Command::Get {
            content_id,
            version_no,
            identifier,
        } => {
            let record = service.get(content_id, version_no, &identifier)?;
            println!("{}", serde_json::to_string(&record)?);
        }
        Command::List {
            content_id,
            version_no,
        } => {
            for record in service.get_all(content_id, version_no)? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Command::Set {
            content_id,
            version_no,
            identifier,
            value,
        } => {
            let value: Value = serde_json::from_str(&value)?;
            let outcome = service.set(content_id, version_no, &identifier, &value)?;
            info!("event=cli_set module=cli status=ok outcome={outcome:?}");
            println!("{outcome:?}");
        }
        Command::Delete {
            content_id,
            version_no,
            identifier,
        } => service.delete(content_id, version_no, identifier.as_deref())?,
        Command::Purge { content_ids } => service.purge(&content_ids)?,
        Command::Copy {
            source_content_id,
            source_version_no,
            target_content_id,
            target_version_no,
        } => {
            let copied = service.copy_version(
                source_content_id,
                source_version_no,
                target_content_id,
                target_version_no,
            )?;
            println!("{copied}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_delete_without_identifier() {
        let cli = Cli::try_parse_from(["cai", "--db", "/tmp/x.db", "delete", "2", "1"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Delete {
                content_id: 2,
                version_no: 1,
                identifier: None
            }
        ));
    }

    #[test]
    fn purge_requires_at_least_one_id() {
        assert!(Cli::try_parse_from(["cai", "purge"]).is_err());
    }
}
