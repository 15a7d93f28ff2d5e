use algocanvas::config::ServerConfig;
use algocanvas::{
    CellState, Grid, PathRequest, SavedVisualization, SortRequest, VisualizationData,
    VisualizationKind, VisualizationStore,
};
use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "algocanvas", about = "Record sorting and pathfinding traces.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sort a list of integers and print the trace.
    Sort {
        /// bubble, selection, insertion or quick
        algorithm: String,

        #[arg(allow_negative_numbers = true)]
        values: Vec<i32>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run a pathfinding request read from a JSON file (`-` for stdin).
    Path {
        request: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Search an ASCII maze (`.` empty, `#` wall, `S` start, `G` goal).
    Maze {
        /// a-star, dfs, bfs or greedy
        algorithm: String,

        layout: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// List saved visualizations, newest first.
    List {
        #[arg(long)]
        owner: Option<String>,

        /// sorting or pathfinding
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<VisualizationKind>,

        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Print step counts and the outcome instead of the full JSON trace.
    #[arg(long)]
    summary: bool,

    /// Store the run as a saved visualization under this name.
    #[arg(long, value_name = "NAME")]
    save: Option<String>,

    /// Owner recorded on saved visualizations.
    #[arg(long, default_value = "local")]
    owner: String,

    /// Where saved visualizations live (defaults to $ALGOCANVAS_DATA_DIR or ./saved).
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

impl OutputArgs {
    fn store(&self) -> io::Result<VisualizationStore> {
        open_store(self.data_dir.clone())
    }

    fn persist(&self, data: VisualizationData) -> Result<(), Box<dyn Error>> {
        if let Some(name) = &self.save {
            let saved = SavedVisualization::new(self.owner.clone(), name.clone(), data);
            let stored = self.store()?.save(&saved)?;
            eprintln!("saved '{}' as {}", name, stored.id);
        }
        Ok(())
    }
}

fn open_store(data_dir: Option<PathBuf>) -> io::Result<VisualizationStore> {
    let config = ServerConfig::from_env().with_overrides(None, data_dir);
    VisualizationStore::open(config.data_dir)
}

fn read_input(path: &Path) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut body = String::new();
        io::stdin().read_to_string(&mut body)?;
        Ok(body)
    } else {
        fs::read_to_string(path)
    }
}

fn run_sort_command(algorithm: String, values: Vec<i32>, output: &OutputArgs) -> Result<(), Box<dyn Error>> {
    let request = SortRequest {
        array: values,
        algorithm,
    };
    let trace = request.execute()?;

    if output.summary {
        println!(
            "{}: {} steps, final {:?}",
            request.algorithm,
            trace.len(),
            trace.final_values().unwrap_or_default()
        );
    } else {
        println!("{}", serde_json::to_string_pretty(&trace)?);
    }

    output.persist(VisualizationData::Sorting { request, trace })
}

fn run_path_command(request: PathRequest, output: &OutputArgs) -> Result<(), Box<dyn Error>> {
    let trace = request.execute()?;

    if output.summary {
        println!(
            "{}: {} steps, path found: {}, path cells: {}",
            request.algorithm,
            trace.len(),
            trace.path_found,
            trace.path_cells()
        );
        if let Some(grid) = trace.final_grid() {
            print!("{}", grid);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&trace)?);
    }

    output.persist(VisualizationData::Pathfinding { request, trace })
}

fn maze_request(algorithm: String, layout: &str) -> Result<PathRequest, Box<dyn Error>> {
    let grid = Grid::parse(layout)?;
    let start = grid.find(CellState::Start).ok_or("maze has no start cell 'S'")?;
    let goal = grid.find(CellState::Goal).ok_or("maze has no goal cell 'G'")?;
    Ok(PathRequest {
        rows: grid.rows() as i64,
        cols: grid.cols() as i64,
        grid,
        start_position: start,
        goal_position: goal,
        algorithm,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match Cli::parse().command {
        Command::Sort {
            algorithm,
            values,
            output,
        } => run_sort_command(algorithm, values, &output),
        Command::Path { request, output } => {
            let body = read_input(&request)?;
            let request: PathRequest = serde_json::from_str(&body)?;
            run_path_command(request, &output)
        }
        Command::Maze {
            algorithm,
            layout,
            output,
        } => {
            let layout = read_input(&layout)?;
            run_path_command(maze_request(algorithm, &layout)?, &output)
        }
        Command::List {
            owner,
            kind,
            data_dir,
        } => {
            let store = open_store(data_dir)?;
            for saved in store.list(owner.as_deref(), kind)? {
                println!(
                    "{}\t{}\t{:?}\t{}\t{}",
                    saved.id,
                    saved.created_at.to_rfc3339(),
                    saved.kind(),
                    saved.owner,
                    saved.name
                );
            }
            Ok(())
        }
    }
}
