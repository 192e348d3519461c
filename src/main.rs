use clap::{Parser, Subcommand};
use resfork::{ResourceFork, TypeCode};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resfork", version, about = "Inspect classic Macintosh resource forks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every resource in the fork
    List {
        input: PathBuf,
    },
    /// Show the attributes of one resource
    Info {
        input: PathBuf,
        /// Resource type, four characters (e.g. ICN#)
        r#type: String,
        id: i16,
    },
    /// Dump the raw bytes of one resource
    Cat {
        input: PathBuf,
        /// Resource type, four characters (e.g. ICN#)
        r#type: String,
        id: i16,
        /// Hex-encode the output instead of writing raw bytes
        #[arg(long)]
        hex: bool,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    match Cli::parse().command {
        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input } => {
            let fork = ResourceFork::open_path(&input)?;
            for t in fork.types() {
                for r in t.refs() {
                    println!(
                        "{} {} ({}b) {}",
                        TypeCode(t.code),
                        r.id,
                        r.size,
                        r.name.as_deref().map(render_name).unwrap_or_default(),
                    );
                }
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, r#type, id } => {
            let code = parse_type(&r#type)?;
            let fork = ResourceFork::open_path(&input)?;
            let attr = fork.attr(code.0, id)?;
            println!("Type: {code}");
            println!("ID:   {}", attr.id);
            println!("Size: {}", attr.size);
            if let Some(name) = attr.name {
                println!("Name: {}", render_name(name));
            }
            println!("Attr: {}", attr.attrs);
        }

        // ── Cat ──────────────────────────────────────────────────────────────
        Commands::Cat { input, r#type, id, hex, output } => {
            let code = parse_type(&r#type)?;
            let fork = ResourceFork::open_path(&input)?;
            let data = fork.read(code.0, id, 0, 0)?;
            let bytes = if hex {
                let mut s = hex::encode(&data);
                s.push('\n');
                s.into_bytes()
            } else {
                data
            };
            match output {
                Some(path) => std::fs::write(path, bytes)?,
                None => std::io::stdout().write_all(&bytes)?,
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn parse_type(s: &str) -> Result<TypeCode, String> {
    let bytes: [u8; 4] = s
        .as_bytes()
        .try_into()
        .map_err(|_| format!("type '{s}' must be exactly 4 characters"))?;
    Ok(TypeCode::from_bytes(bytes))
}

/// Resource names are MacRoman; show what is printable, escape the rest.
fn render_name(name: &[u8]) -> String {
    name.iter()
        .map(|&b| {
            if (0x20..0x7f).contains(&b) {
                (b as char).to_string()
            } else {
                format!("\\x{b:02x}")
            }
        })
        .collect()
}
