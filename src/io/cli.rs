use crate::io::config::Config;
use crate::pipeline::repository::Discovery;
use clap::Parser;
use log::info;
use std::path::PathBuf;

/// Command line of the scene previewer.
#[derive(Parser, Debug)]
#[command(name = "csg-scenes")]
#[command(about = "Resolves CSG scenes (built-in or TOML scripts) and renders wireframe previews")]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Name of the scene to render
    #[arg(short, long, default_value = "Default")]
    pub scene: String,

    /// Builder parameter, e.g. "n=1.5, mat=glass"
    #[arg(short, long, default_value = "")]
    pub param: String,

    /// List the available scenes and exit
    #[arg(long)]
    pub list: bool,

    /// Add a scene script
    #[arg(long = "scene-file", value_name = "FILE")]
    pub scene_files: Vec<PathBuf>,

    /// Add every scene script in a directory
    #[arg(long = "dir", value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Add scene scripts matching `dir/pattern` (one `*` allowed)
    #[arg(long = "mask", value_name = "MASK")]
    pub masks: Vec<PathBuf>,

    /// Do not register the built-in scenes
    #[arg(long)]
    pub no_default: bool,

    /// Preview an OBJ mesh instead of a scene
    #[arg(long, value_name = "FILE")]
    pub obj: Option<PathBuf>,

    /// Output image (overrides the config)
    #[arg(short, long)]
    pub output: Option<String>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Resolve this many animation frames against one shared context
    #[arg(long, default_value_t = 1)]
    pub frames: u32,
}

impl Cli {
    /// Parses the process arguments and loads the configuration they name.
    pub fn process() -> Result<(Self, Config), String> {
        let cli = Self::parse();
        let config = cli.load_config()?;
        Ok((cli, config))
    }

    pub fn load_config(&self) -> Result<Config, String> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading config file: {}", path.display());
                Config::load(path)?
            }
            None => {
                info!("Using default settings");
                Config::default()
            }
        };

        if let Some(w) = self.width {
            config.render.width = w;
        }
        if let Some(h) = self.height {
            config.render.height = h;
        }
        if let Some(out) = &self.output {
            config.render.output = out.clone();
        }
        Ok(config)
    }

    /// Script sources named on the command line and in the config.
    pub fn discovery(&self, config: &Config) -> Discovery {
        let mut dirs = config.scripts.dirs.clone();
        dirs.extend(self.dirs.iter().cloned());
        Discovery {
            scene_files: self.scene_files.clone(),
            dirs,
            masks: self.masks.clone(),
            no_default: self.no_default,
        }
    }
}
