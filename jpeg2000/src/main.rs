use clap::{Args, Parser, ValueEnum};
use log::info;
use std::error;
use std::error::Error;
use std::ffi::OsStr;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use jpc::{
    block_rect, read_main_header, BlockReader, CodestreamError, CodestreamLayout,
    ImageAndTileSizeMarkerSegment, IndexOptions, ScanStrategyKind, ZeroLengthPolicy,
};

mod container;

use container::find_codestream;

#[derive(Debug)]
enum JP2000Error {
    DecodingContainer { error: String },
    DecodingCodestream { error: String },
    MissingGeometry { parameter: &'static str },
    UnsupportedExtension { extension: String },
}

impl error::Error for JP2000Error {}
impl fmt::Display for JP2000Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DecodingContainer { error } => {
                write!(f, "error decoding jp2 container {}", error)
            }
            Self::DecodingCodestream { error } => {
                write!(f, "error decoding jpc codestream {}", error)
            }
            Self::MissingGeometry { parameter } => {
                write!(f, "no SIZ to take {} from, pass --{}", parameter, parameter)
            }
            Self::UnsupportedExtension { extension } => {
                write!(
                    f,
                    "unsupported extension {}, pass --offset for raw codestreams",
                    extension
                )
            }
        }
    }
}

impl From<CodestreamError> for JP2000Error {
    fn from(error: CodestreamError) -> JP2000Error {
        JP2000Error::DecodingCodestream {
            error: error.to_string(),
        }
    }
}

#[derive(Parser)]
#[clap(version, about = "Random access to the tile-parts of JPEG 2000 codestreams")]
struct Opts {
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    /// Print the offset and size of every block
    Index(Index),

    /// Map a pixel to its block and the block's byte range
    Locate(Locate),

    /// Write the compressed bytes of the block holding a pixel
    Extract(Extract),

    /// Print markers, main header segments and tile-part headers (stdout)
    Dump(Dump),
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Walk every byte, trusting markers only
    Exhaustive,

    /// Jump between tile-parts by their declared lengths
    Declared,

    /// Use the TLM marker segments of the main header
    Tlm,
}

impl From<Strategy> for ScanStrategyKind {
    fn from(strategy: Strategy) -> ScanStrategyKind {
        match strategy {
            Strategy::Exhaustive => ScanStrategyKind::Exhaustive,
            Strategy::Declared => ScanStrategyKind::DeclaredLengths,
            Strategy::Tlm => ScanStrategyKind::TileLengthMarkers,
        }
    }
}

#[derive(Args)]
struct Source {
    /// Path to .jp2 container or .j2k/.jpc/.j2c codestream file
    path: PathBuf,

    /// Byte offset of the codestream, skips the container lookup
    #[clap(long)]
    offset: Option<u64>,

    /// Block rows, defaults to the number of tile rows in SIZ
    #[clap(long)]
    rows: Option<u32>,

    /// Block columns, defaults to the number of tile columns in SIZ
    #[clap(long)]
    columns: Option<u32>,

    /// Block width in pixels, defaults to XTsiz
    #[clap(long)]
    block_width: Option<u32>,

    /// Block height in pixels, defaults to YTsiz
    #[clap(long)]
    block_height: Option<u32>,

    #[clap(long, value_enum, default_value = "exhaustive")]
    strategy: Strategy,

    /// Accept tile-parts that are not in raster order
    #[clap(long)]
    no_order_check: bool,

    /// Fail on tile-parts declaring zero length instead of searching for
    /// their end
    #[clap(long)]
    reject_zero_length: bool,
}

#[derive(Parser)]
struct Index {
    #[clap(flatten)]
    source: Source,
}

#[derive(Parser)]
struct Locate {
    #[clap(flatten)]
    source: Source,

    #[clap(allow_negative_numbers = true)]
    x: i64,

    #[clap(allow_negative_numbers = true)]
    y: i64,
}

#[derive(Parser)]
struct Extract {
    #[clap(flatten)]
    source: Source,

    #[clap(allow_negative_numbers = true)]
    x: i64,

    #[clap(allow_negative_numbers = true)]
    y: i64,

    /// Output file, stdout when absent
    #[clap(short, long)]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct Dump {
    #[clap(flatten)]
    source: Source,
}

struct Geometry {
    layout: CodestreamLayout,
    block_width: u32,
    block_height: u32,
}

fn data_offset(source: &Source, reader: &mut BufReader<File>) -> Result<u64, JP2000Error> {
    if let Some(offset) = source.offset {
        return Ok(offset);
    }

    let extension = source
        .path
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or("");
    match extension {
        "jp2" => find_codestream(reader).map_err(|error| JP2000Error::DecodingContainer {
            error: error.to_string(),
        }),
        "j2k" | "jpc" | "j2c" => Ok(0),
        _ => Err(JP2000Error::UnsupportedExtension {
            extension: extension.to_owned(),
        }),
    }
}

// Whatever was not passed on the command line comes from SIZ
fn geometry(source: &Source, reader: &mut BufReader<File>) -> Result<Geometry, JP2000Error> {
    let data_offset = data_offset(source, reader)?;

    let given = [
        source.rows,
        source.columns,
        source.block_width,
        source.block_height,
    ];
    let (rows, columns, block_width, block_height) =
        if let [Some(rows), Some(columns), Some(block_width), Some(block_height)] = given {
            (rows, columns, block_width, block_height)
        } else {
            let header = read_main_header(reader, data_offset, &mut ())?;
            let siz = header.image_and_tile_size_marker_segment();
            let from_siz = |given: Option<u32>,
                            parameter: &'static str,
                            value: fn(&ImageAndTileSizeMarkerSegment) -> u32| {
                given
                    .or_else(|| siz.map(value))
                    .ok_or(JP2000Error::MissingGeometry { parameter })
            };
            (
                from_siz(source.rows, "rows", ImageAndTileSizeMarkerSegment::num_y_tiles)?,
                from_siz(source.columns, "columns", ImageAndTileSizeMarkerSegment::num_x_tiles)?,
                from_siz(
                    source.block_width,
                    "block-width",
                    ImageAndTileSizeMarkerSegment::reference_tile_width,
                )?,
                from_siz(
                    source.block_height,
                    "block-height",
                    ImageAndTileSizeMarkerSegment::reference_tile_height,
                )?,
            )
        };

    info!(
        "codestream at byte offset {}, {}x{} blocks of {}x{} pixels",
        data_offset, rows, columns, block_width, block_height
    );
    Ok(Geometry {
        layout: CodestreamLayout {
            data_offset,
            rows,
            columns,
        },
        block_width,
        block_height,
    })
}

fn open(source: &Source) -> Result<BlockReader<BufReader<File>>, Box<dyn Error>> {
    let file = File::open(&source.path)?;
    let mut reader = BufReader::new(file);
    let geometry = geometry(source, &mut reader)?;

    let options = IndexOptions {
        strategy: source.strategy.into(),
        verify_tile_order: !source.no_order_check,
        zero_length: if source.reject_zero_length {
            ZeroLengthPolicy::Reject
        } else {
            ZeroLengthPolicy::ScanForward
        },
    };

    Ok(BlockReader::new(
        reader,
        geometry.layout,
        geometry.block_width,
        geometry.block_height,
    )
    .with_options(options))
}

fn run() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let opts: Opts = Opts::parse();

    let mut out = io::stdout().lock();
    match opts.subcommand {
        SubCommand::Index(c) => {
            let mut reader = open(&c.source)?;
            let index = reader.build_index().map_err(JP2000Error::from)?;
            let (block_width, block_height) = reader.block_size();

            writeln!(out, "row\tcolumn\toffset\tsize\tx0\ty0\tx1\ty1")?;
            for row in 0..index.rows() {
                for column in 0..index.columns() {
                    if let Some(extent) = index.extent(row, column) {
                        let rect = block_rect(block_width, block_height, row, column);
                        writeln!(
                            out,
                            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                            row,
                            column,
                            extent.offset,
                            extent.length,
                            rect.x0,
                            rect.y0,
                            rect.x1,
                            rect.y1
                        )?;
                    }
                }
            }
            if let Some(size) = index.uniform_size() {
                writeln!(out, "all blocks are {} bytes", size)?;
            }
        }
        SubCommand::Locate(c) => {
            let mut reader = open(&c.source)?;
            let extent = reader.block_extent(c.x, c.y).map_err(JP2000Error::from)?;
            let rect = reader.block_rect(c.x, c.y).map_err(JP2000Error::from)?;
            writeln!(
                out,
                "pixel ({}, {}) is in block row {} column {} covering ({}, {}) to ({}, {})",
                c.x, c.y, extent.row, extent.column, rect.x0, rect.y0, rect.x1, rect.y1
            )?;
            writeln!(
                out,
                "offset {} length {}",
                extent.offset, extent.length
            )?;
        }
        SubCommand::Extract(c) => {
            let mut reader = open(&c.source)?;
            let block = reader.read_block(c.x, c.y).map_err(JP2000Error::from)?;
            match &c.output {
                Some(path) => File::create(path)?.write_all(block)?,
                None => out.write_all(block)?,
            }
        }
        SubCommand::Dump(c) => {
            let mut reader = open(&c.source)?;
            reader.dump(&mut out).map_err(JP2000Error::from)?;
        }
    }
    out.flush()?;

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    match run() {
        Err(e) => Err(e.to_string().into()),
        Ok(_) => Ok(()),
    }
}
