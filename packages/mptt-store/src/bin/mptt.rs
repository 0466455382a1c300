//! mptt - Nested set tree store CLI
//!
//! # Usage
//!
//! ```bash
//! # Build a tree
//! mptt --db food.db add-root Food
//! mptt --db food.db add-child Meat --parent 1
//! mptt --db food.db add-sibling Fruit --sibling 2
//!
//! # Import a nested YAML/JSON description
//! mptt --db food.db import food.yaml
//!
//! # Query
//! mptt --db food.db tree
//! mptt --db food.db --json path 1 4
//! ```

use clap::{Parser, Subcommand};
use mptt_store::domain::validate;
use mptt_store::logging::init_logging;
use mptt_store::{
    append_child, import_subtree, import_tree, ConnectionManager, MpttTree, RecordId,
    SqliteTreeStore, StorageError, StoreConfig, TransactionManager, TreeRecord, TreeSpec,
    TreeStore,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mptt")]
#[command(about = "Nested set (MPTT) tree store", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides configuration)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema and report the record count
    Init,

    /// Store a root record at (1, 2)
    AddRoot { name: String },

    /// Store a record as the first child of PARENT
    AddChild {
        name: String,
        #[arg(short, long)]
        parent: RecordId,
    },

    /// Store a record right after SIBLING
    AddSibling {
        name: String,
        #[arg(short, long)]
        sibling: RecordId,
    },

    /// Store a record as the last child of PARENT
    Append {
        name: String,
        #[arg(short, long)]
        parent: RecordId,
    },

    /// Import a nested YAML/JSON tree description
    Import {
        file: PathBuf,
        /// Attach under this record instead of creating a new root
        #[arg(short, long)]
        parent: Option<RecordId>,
    },

    /// Print the stored tree as a YAML description
    Export,

    /// List all records in pre-order
    List,

    /// Look up one record
    Get {
        #[arg(long, conflicts_with = "name", required_unless_present = "name")]
        id: Option<RecordId>,
        #[arg(long)]
        name: Option<String>,
    },

    /// All descendants of a record
    Descendants { id: RecordId },

    /// Direct children of a record
    Children { id: RecordId },

    /// Records on the path from FROM down to TO
    Path { from: RecordId, to: RecordId },

    /// Records without children
    Leaves,

    /// Print the tree indented by depth
    Tree,

    /// Check the stored records against the nested set invariants
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> mptt_store::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_yaml(path)?,
        None => StoreConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> mptt_store::Result<()> {
    let config = load_config(&cli)?;
    init_logging(&config.logging)?;

    let store = SqliteTreeStore::new(ConnectionManager::from_config(&config.database)?)?;
    let json = cli.json;

    match cli.command {
        Commands::Init => {
            println!("{}: {} records", config.database.path, store.count()?);
        }
        Commands::AddRoot { name } => {
            let record = store.in_transaction(|| store.create_as_root(&name))?;
            print_records(&[record], json)?;
        }
        Commands::AddChild { name, parent } => {
            let record = store.in_transaction(|| store.create_as_child(&name, parent))?;
            print_records(&[record], json)?;
        }
        Commands::AddSibling { name, sibling } => {
            let record = store.in_transaction(|| store.create_as_sibling(&name, sibling))?;
            print_records(&[record], json)?;
        }
        Commands::Append { name, parent } => {
            let record = store.in_transaction(|| append_child(&store, &name, parent))?;
            print_records(&[record], json)?;
        }
        Commands::Import { file, parent } => {
            let spec = TreeSpec::from_yaml_str(&std::fs::read_to_string(&file)?)?;
            let root = match parent {
                Some(parent_id) => import_subtree(&store, &spec, parent_id)?,
                None => import_tree(&store, &spec)?,
            };
            println!("imported {} records under {}", spec.size(), root.id);
        }
        Commands::Export => {
            let tree = MpttTree::build(store.find_all()?)?;
            print!("{}", TreeSpec::from_tree(&tree).to_yaml()?);
        }
        Commands::List => print_records(&store.find_all()?, json)?,
        Commands::Get { id, name } => {
            let record = match (id, name) {
                (Some(id), _) => store.find_by_id(id)?,
                (None, Some(name)) => store.find_by_name(&name)?,
                (None, None) => None,
            };
            match record {
                Some(record) => print_records(&[record], json)?,
                None => println!("not found"),
            }
        }
        Commands::Descendants { id } => {
            let parent = require(&store, id)?;
            print_records(&store.find_children(&parent)?, json)?;
        }
        Commands::Children { id } => {
            print_records(&store.find_immediate_children(id)?, json)?;
        }
        Commands::Path { from, to } => {
            let first = require(&store, from)?;
            let last = require(&store, to)?;
            print_records(&store.find_path(&first, &last)?, json)?;
        }
        Commands::Leaves => print_records(&store.find_leaves()?, json)?,
        Commands::Tree => {
            let tree = MpttTree::build(store.find_all()?)?;
            for record in tree.dfs() {
                let depth = tree.depth(record).unwrap_or(0);
                println!(
                    "{}{} [{}] ({}, {})",
                    "  ".repeat(depth),
                    record.name,
                    record.id,
                    record.left,
                    record.right
                );
            }
        }
        Commands::Check => {
            validate(&store.find_all()?)?;
            println!("ok: {} records", store.count()?);
        }
    }

    Ok(())
}

fn require(store: &SqliteTreeStore, id: RecordId) -> mptt_store::Result<TreeRecord> {
    store
        .find_by_id(id)?
        .ok_or_else(|| StorageError::record_not_found(id))
}

fn print_records(records: &[TreeRecord], json: bool) -> mptt_store::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }
    println!("{:>6}  {:<24} {:>6} {:>6} {:>6}", "id", "name", "pid", "lft", "rht");
    for record in records {
        println!(
            "{:>6}  {:<24} {:>6} {:>6} {:>6}",
            record.id,
            record.name,
            record.persisted_parent_id(),
            record.left,
            record.right
        );
    }
    Ok(())
}
