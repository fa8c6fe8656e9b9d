use clap::{Args, Parser, Subcommand};
use crystal_render::physics::{BondMethod, CellMode};
use crystal_render::rendering::{Color, ColorScheme, RadiusScheme};
use crystal_render::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Render crystal structures (CIF, POSCAR, JSON) to PNG images without a display."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Settings file to use instead of the one in the user config directory
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render one structure file to a PNG image.
    Render(RenderArgs),
    /// Rasterize a scene document (JSON primitive tree).
    Scene(SceneArgs),
    /// Render many structure files into a directory in parallel.
    Batch(BatchArgs),
    /// Convert a structure file between CIF, POSCAR and JSON.
    Convert(ConvertArgs),
    /// Show or initialize the settings file.
    Config(ConfigArgs),
}

/// Everything that can override a field of the settings file.
#[derive(Args, Debug, Default)]
pub struct StyleArgs {
    // --- Cell ---
    /// Cell to draw: input, conventional or primitive
    #[arg(long, value_name = "MODE")]
    pub cell: Option<CellMode>,

    /// Supercell repeat along a, b, c (e.g. 2,2,1)
    #[arg(long, value_name = "NA,NB,NC", value_parser = parse_repeat)]
    pub repeat: Option<[u32; 3]>,

    /// Duplicate atoms sitting on cell faces, edges and corners
    #[arg(long)]
    pub show_boundary: bool,

    /// Add periodic images of atoms bonded across the cell boundary
    #[arg(long)]
    pub show_bonded_outside: bool,

    // --- Bonding ---
    /// Bonding method: crystalnn or cutoff
    #[arg(long, value_name = "METHOD")]
    pub bonding: Option<BondMethod>,

    /// Bond search radius for the cutoff method (Å)
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    // --- Style ---
    /// Element color scheme: vesta or jmol
    #[arg(long, value_name = "SCHEME")]
    pub colors: Option<ColorScheme>,

    /// Atom radius scheme: uniform, covalent or ionic
    #[arg(long, value_name = "SCHEME")]
    pub radii: Option<RadiusScheme>,

    /// Radius used by the uniform scheme and as fallback (Å)
    #[arg(long, value_name = "FLOAT")]
    pub uniform_radius: Option<f64>,

    /// Bond cylinder radius (Å)
    #[arg(long, value_name = "FLOAT")]
    pub bond_radius: Option<f64>,

    // --- Orientation ---
    /// Miller plane to face the viewer (e.g. 1,1,1)
    #[arg(long, value_name = "H,K,L", value_parser = parse_index, allow_hyphen_values = true)]
    pub miller: Option<[i32; 3]>,

    /// Lattice direction to point right on screen (e.g. 1,-1,0)
    #[arg(long, value_name = "U,V,W", value_parser = parse_index, allow_hyphen_values = true)]
    pub in_plane: Option<[i32; 3]>,

    // --- Labels ---
    /// Draw element labels next to atoms
    #[arg(long)]
    pub show_labels: bool,

    /// Only label these elements (comma-separated)
    #[arg(long, value_name = "EL,EL", value_delimiter = ',')]
    pub label_elements: Option<Vec<String>>,

    /// Label font size in pixels
    #[arg(long, value_name = "INT")]
    pub label_size: Option<u32>,

    // --- Image ---
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Background color (#rrggbb, #rgb or a color name)
    #[arg(long, value_name = "COLOR")]
    pub background: Option<Color>,

    /// Draw the unit cell edges
    #[arg(long)]
    pub show_unit_cell: bool,

    /// Draw the element color legend
    #[arg(long)]
    pub legend: bool,

    /// Skip atoms (only bonds and cell are drawn)
    #[arg(long)]
    pub hide_atoms: bool,

    /// Skip bond generation and drawing
    #[arg(long)]
    pub hide_bonds: bool,
}

impl StyleArgs {
    /// Writes every flag that was given on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.cell {
            config.cell.mode = mode;
        }
        if let Some(repeat) = self.repeat {
            config.cell.repeat = repeat;
        }
        config.cell.show_boundary_images |= self.show_boundary;
        config.cell.show_bonded_outside |= self.show_bonded_outside;

        if let Some(method) = self.bonding {
            config.bonding.method = method;
        }
        if let Some(cutoff) = self.cutoff {
            config.bonding.cutoff = cutoff;
        }

        if let Some(colors) = self.colors {
            config.style.colors = colors;
        }
        if let Some(radii) = self.radii {
            config.style.radii = radii;
        }
        if let Some(r) = self.uniform_radius {
            config.style.uniform_radius = r;
        }
        if let Some(r) = self.bond_radius {
            config.style.bond_radius = r;
        }

        if self.miller.is_some() {
            config.orientation.miller = self.miller;
        }
        if self.in_plane.is_some() {
            config.orientation.in_plane = self.in_plane;
        }

        config.labels.show |= self.show_labels;
        if let Some(elements) = &self.label_elements {
            config.labels.elements = Some(elements.clone());
        }
        if let Some(size) = self.label_size {
            config.labels.font_size = size;
        }

        if let Some(w) = self.width {
            config.render.width = w;
        }
        if let Some(h) = self.height {
            config.render.height = h;
        }
        if let Some(bg) = self.background {
            config.render.background = bg;
        }
        config.render.show_unit_cell |= self.show_unit_cell;
        config.render.include_legend |= self.legend;
        if self.hide_atoms {
            config.render.show_atoms = false;
        }
        if self.hide_bonds {
            config.render.show_bonds = false;
        }
    }
}

/// Arguments for the `render` subcommand.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Input structure file (.cif, .vasp, POSCAR, .json)
    #[arg(short, long, alias = "cif", required = true, value_name = "PATH")]
    pub structure: PathBuf,

    /// Output PNG path; parent directories are created
    #[arg(short, long, required = true, value_name = "PATH")]
    pub out: PathBuf,

    #[command(flatten)]
    pub style: StyleArgs,
}

/// Arguments for the `scene` subcommand.
#[derive(Args, Debug)]
pub struct SceneArgs {
    /// Scene document (JSON)
    #[arg(long, required = true, value_name = "PATH")]
    pub scene: PathBuf,

    #[arg(short, long, required = true, value_name = "PATH")]
    pub out: PathBuf,

    /// Direction to look down before drawing (e.g. 1,1,1)
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_direction, allow_hyphen_values = true)]
    pub view: Option<[f64; 3]>,

    /// Structure whose lattice interprets --view and whose elements fill the legend
    #[arg(long, value_name = "PATH")]
    pub lattice_from: Option<PathBuf>,

    #[arg(long)]
    pub legend: bool,

    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    #[arg(long, value_name = "COLOR")]
    pub background: Option<Color>,
}

/// Arguments for the `batch` subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Structure files to render
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Directory receiving one <stem>.png per input
    #[arg(short, long, required = true, value_name = "DIR")]
    pub out_dir: PathBuf,

    #[command(flatten)]
    pub style: StyleArgs,
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output file; .cif and .json select those formats, anything else is POSCAR
    #[arg(short, long, required = true, value_name = "PATH")]
    pub out: PathBuf,

    /// Cell to write: input, conventional or primitive
    #[arg(long, value_name = "MODE")]
    pub cell: Option<CellMode>,
}

/// Arguments for the `config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write the default settings to the settings file
    #[arg(long)]
    pub save_defaults: bool,
}

fn parse_triple<T: std::str::FromStr>(s: &str) -> Result<[T; 3], String> {
    let parts: Vec<&str> = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 {
        return Err(format!("expected three comma-separated values, got '{}'", s));
    }
    let mut out = Vec::with_capacity(3);
    for p in parts {
        out.push(p.parse::<T>().map_err(|_| format!("invalid number '{}'", p))?);
    }
    out.try_into()
        .map_err(|_| format!("expected three values, got '{}'", s))
}

fn parse_index(s: &str) -> Result<[i32; 3], String> {
    parse_triple(s)
}

fn parse_repeat(s: &str) -> Result<[u32; 3], String> {
    parse_triple(s)
}

fn parse_direction(s: &str) -> Result<[f64; 3], String> {
    parse_triple(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_flags_override_config() {
        let cli = Cli::parse_from([
            "crender",
            "-vv",
            "render",
            "--cif",
            "NaCl.cif",
            "-o",
            "out/nacl.png",
            "--cell",
            "Conventional",
            "--repeat",
            "2,2,1",
            "--bonding",
            "cutoff",
            "--cutoff",
            "3.2",
            "--miller",
            "1,-1,0",
            "--label-elements",
            "Na,Cl",
            "--background",
            "#000",
            "--legend",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.structure, PathBuf::from("NaCl.cif"));

        let mut config = Config::default();
        args.style.apply(&mut config);
        assert_eq!(config.cell.mode, CellMode::Conventional);
        assert_eq!(config.cell.repeat, [2, 2, 1]);
        assert_eq!(config.bonding.method, BondMethod::Cutoff);
        assert_eq!(config.bonding.cutoff, 3.2);
        assert_eq!(config.orientation.miller, Some([1, -1, 0]));
        assert_eq!(config.orientation.in_plane, None);
        assert_eq!(
            config.labels.elements,
            Some(vec!["Na".to_string(), "Cl".to_string()])
        );
        assert_eq!(config.render.background, Color::BLACK);
        assert!(config.render.include_legend);
        assert!(config.render.show_atoms);
    }

    #[test]
    fn test_unknown_option_value_fails_to_parse() {
        let res = Cli::try_parse_from(["crender", "render", "-s", "a.cif", "-o", "a.png", "--radii", "vdw"]);
        assert!(res.is_err());
        let res = Cli::try_parse_from(["crender", "render", "-s", "a.cif", "-o", "a.png", "--repeat", "2,2"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_no_flags_leaves_config_alone() {
        let mut config = Config::default();
        StyleArgs::default().apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_triple_parsing() {
        assert_eq!(parse_index("1, 1, 0"), Ok([1, 1, 0]));
        assert_eq!(parse_direction("0,0,1"), Ok([0.0, 0.0, 1.0]));
        assert!(parse_repeat("1,-1,1").is_err());
        assert!(parse_index("1,1,1,1").is_err());
    }
}
