use std::fs;

use agent_history::{
    diff::{word_diff, DiffLine, LineKind},
    history::{
        date_preset, filter_by_date_range, search_versions, seed_demo_history, stats,
        versions_by_tag, versions_within_days, Version, VersionAuthor,
    },
    FieldDiffMode, HistoryConfig, VersionStore,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agent-history")]
#[command(about = "Version history, diff and rollback for agent configurations")]
struct Cli {
    /// Storage URL: memory://, file://path, sqlite://path, or
    /// s3://access_key:secret_key@endpoint/bucket/prefix?region=us-east-1
    #[arg(
        long = "storage-url",
        env = "AGENT_HISTORY_STORAGE_URL",
        default_value = "file://.agent-history"
    )]
    storage_url: String,

    /// Prefix for every storage key
    #[arg(long, default_value = "agent-history")]
    prefix: String,

    /// Diff fields over parsed YAML instead of the line scanner
    #[arg(long)]
    structural: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AuthorArgs {
    #[arg(long = "author-name")]
    name: String,
    #[arg(long = "author-email")]
    email: String,
}

impl AuthorArgs {
    fn author(&self) -> VersionAuthor {
        VersionAuthor::new(&self.email, &self.name, &self.email)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List versions, most recent first
    Log {
        agent: String,
        /// Match message, author or tag
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// Only versions from the last N days
        #[arg(long)]
        days: Option<i64>,
        /// today, yesterday, last7days, last30days, thisMonth, lastMonth or all
        #[arg(long)]
        preset: Option<String>,
    },
    /// Print the content of one version
    Show { agent: String, version_id: String },
    /// Record the content of a file as a new version
    Save {
        agent: String,
        file: String,
        #[command(flatten)]
        author: AuthorArgs,
        #[arg(short, long, default_value = "")]
        message: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Compare two versions
    Diff {
        agent: String,
        from: String,
        to: String,
        /// Highlight changed words within modified lines
        #[arg(long)]
        words: bool,
    },
    /// Mark a version as deployed
    Deploy { agent: String, version_id: String },
    /// Create a new deployed version with the content of an older one
    Rollback {
        agent: String,
        version_id: String,
        #[command(flatten)]
        author: AuthorArgs,
    },
    /// Replace the tags of a version
    Tag {
        agent: String,
        version_id: String,
        tags: Vec<String>,
    },
    /// Summary statistics for an agent
    Stats { agent: String },
    /// List agents with stored history
    Agents,
    /// Insert example versions for an agent without history
    Seed { agent: String },
    /// Delete all history of an agent
    Clear { agent: String },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = HistoryConfig {
        key_prefix: cli.prefix.clone(),
        field_diff_mode: if cli.structural {
            FieldDiffMode::Structural
        } else {
            FieldDiffMode::Flat
        },
    };
    let store = VersionStore::builder()
        .url(&cli.storage_url)
        .context("opening storage")?
        .config(config)
        .build();

    match cli.command {
        Commands::Log { agent, search, tag, days, preset } => {
            let mut history = store.history(&agent);
            if let Some(query) = search {
                history = search_versions(&history, &query);
            }
            if let Some(tag) = tag {
                history = versions_by_tag(&history, &tag);
            }
            if let Some(days) = days {
                history = versions_within_days(&history, days);
            }
            if let Some(preset) = preset {
                history = filter_by_date_range(&history, &date_preset(&preset)?);
            }
            let current_id = store.current(&agent).map(|v| v.id);
            print_log(&history, current_id.as_deref());
        }
        Commands::Show { agent, version_id } => {
            let version = store
                .version(&agent, &version_id)
                .with_context(|| format!("no version {} for agent {}", version_id, agent))?;
            print!("{}", version.content);
            if !version.content.ends_with('\n') {
                println!();
            }
        }
        Commands::Save { agent, file, author, message, tags } => {
            let content = fs::read_to_string(&file).with_context(|| format!("reading {}", file))?;
            let version = store.save_version(&agent, &content, &author.author(), &message, &tags)?;
            println!("Saved version {} ({})", version.version, version.id);
            for change in &version.changes {
                println!(
                    "  {:?} {}: {} -> {}",
                    change.kind,
                    change.field,
                    change.old_value.as_deref().unwrap_or("-"),
                    change.new_value.as_deref().unwrap_or("-")
                );
            }
        }
        Commands::Diff { agent, from, to, words } => {
            let result = store.compare_versions(&agent, &from, &to)?;
            print_lines(&result.line_diff.lines, words);
            println!(
                "\n{} additions, {} deletions, {} unchanged",
                result.line_diff.additions, result.line_diff.deletions, result.line_diff.unchanged
            );
            println!(
                "fields: {} added, {} removed, {} modified",
                result.summary.added, result.summary.removed, result.summary.modified
            );
        }
        Commands::Deploy { agent, version_id } => {
            store.set_deployed(&agent, &version_id)?;
            println!("Deployed {}", version_id);
        }
        Commands::Rollback { agent, version_id, author } => {
            let version = store.rollback(&agent, &version_id, &author.author())?;
            println!("{} as version {} ({})", version.message, version.version, version.id);
        }
        Commands::Tag {
            agent,
            version_id,
            tags,
        } => match store.update_tags(&agent, &version_id, &tags)? {
            Some(version) => {
                println!("Version {} tags: {}", version.version, version.tags.join(", "))
            }
            None => println!("No version {} for agent {}", version_id, agent),
        },
        Commands::Stats { agent } => {
            let stats = stats(&store.history(&agent));
            println!("total:        {}", stats.total);
            println!("today:        {}", stats.today);
            println!("last 7 days:  {}", stats.this_week);
            println!("last 30 days: {}", stats.this_month);
            println!("most active:  {}", stats.most_active_author.as_deref().unwrap_or("-"));
            println!("avg changes:  {:.1}", stats.average_changes);
        }
        Commands::Agents => {
            for agent in store.agents() {
                println!("{}", agent);
            }
        }
        Commands::Seed { agent } => {
            let history = seed_demo_history(&store, &agent)?;
            println!("Agent {} has {} versions", agent, history.len());
        }
        Commands::Clear { agent } => {
            store.clear_history(&agent)?;
            println!("Cleared history of {}", agent);
        }
    }

    Ok(())
}

fn print_log(history: &[Version], current_id: Option<&str>) {
    if history.is_empty() {
        println!("No versions found");
        return;
    }
    for version in history {
        let marker = if Some(version.id.as_str()) == current_id { "*" } else { " " };
        let deployed = if version.is_deployed { " [deployed]" } else { "" };
        let tags = if version.tags.is_empty() {
            String::new()
        } else {
            format!(" ({})", version.tags.join(", "))
        };
        println!(
            "{} v{:<4} {}  {}  {} <{}>{}{}\n         {}",
            marker,
            version.version,
            version.id,
            version.timestamp.format("%Y-%m-%d %H:%M"),
            version.author.name,
            version.author.email,
            deployed,
            tags,
            version.message
        );
    }
}

fn print_lines(lines: &[DiffLine], words: bool) {
    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        // A removed line directly followed by an added one reads as a modification
        if words
            && line.kind == LineKind::Removed
            && lines.get(i + 1).is_some_and(|next| next.kind == LineKind::Added)
        {
            let next = &lines[i + 1];
            let inline: String = word_diff(&line.content, &next.content)
                .iter()
                .map(|w| match w.kind {
                    LineKind::Added => format!("{{+{}+}}", w.value),
                    LineKind::Removed => format!("[-{}-]", w.value),
                    LineKind::Unchanged => w.value.clone(),
                })
                .collect();
            println!("~ {}", inline);
            i += 2;
            continue;
        }
        let sign = match line.kind {
            LineKind::Added => '+',
            LineKind::Removed => '-',
            LineKind::Unchanged => ' ',
        };
        println!("{} {}", sign, line.content);
        i += 1;
    }
}
