use anyhow::Context;
use argh::FromArgs;
use log::info;
use mosaic::decoder::decode_header;
use mosaic::io::{load_pixels, read_mosaic, write_atomic, write_mosaic};
use mosaic::reduce::{reduce, ReduceConfig};
use mosaic::render::{render, RenderConfig};
use mosaic::text::to_text;
use mosaic::{ByteReader, Mode, HEADER_BITS};
use std::io::Cursor;
use std::path::PathBuf;

#[derive(FromArgs, Debug)]
/// Reduce images to woven-mosaic thread grids and render them back
struct Cli {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Command {
    Encode(EncodeCmd),
    Render(RenderCmd),
    Info(InfoCmd),
    Text(TextCmd),
}

#[derive(FromArgs, Debug)]
/// Reduce an image to a mosaic file
#[argh(subcommand, name = "encode")]
struct EncodeCmd {
    /// image to reduce
    #[argh(positional)]
    image: PathBuf,

    /// mosaic file to write
    #[argh(positional)]
    output: PathBuf,

    /// number of threads across the mosaic
    #[argh(option, short = 't')]
    threads: u32,

    /// number of crosses down the mosaic (defaults to the image height)
    #[argh(option, short = 'c')]
    crosses: Option<u32>,

    /// regions darker than this become dark cells
    #[argh(option, default = "128.0")]
    threshold: f32,

    /// mono or rgb
    #[argh(option, short = 'm', default = "Mode::Monochrome", from_str_fn(parse_mode))]
    mode: Mode,

    /// write the text rendition instead of the binary format
    #[argh(switch)]
    text: bool,
}

#[derive(FromArgs, Debug)]
/// Render a mosaic file to an image
#[argh(subcommand, name = "render")]
struct RenderCmd {
    /// mosaic file to read
    #[argh(positional)]
    mosaic: PathBuf,

    /// image to write, format taken from the extension
    #[argh(positional)]
    output: PathBuf,

    /// pixel width of one cell
    #[argh(option, default = "8")]
    cell_width: u32,

    /// pixel height of one cell
    #[argh(option, default = "8")]
    cell_height: u32,
}

#[derive(FromArgs, Debug)]
/// Print the header of a mosaic file
#[argh(subcommand, name = "info")]
struct InfoCmd {
    /// mosaic file to inspect
    #[argh(positional)]
    mosaic: PathBuf,
}

#[derive(FromArgs, Debug)]
/// Print a mosaic file as rows of 0 and 1
#[argh(subcommand, name = "text")]
struct TextCmd {
    /// mosaic file to print
    #[argh(positional)]
    mosaic: PathBuf,
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    match value {
        "mono" | "greyscale" | "grayscale" => Ok(Mode::Monochrome),
        "rgb" | "color" => Ok(Mode::TriChannel),
        other => Err(format!("unknown mode '{other}', expected mono or rgb")),
    }
}

fn encode(cmd: EncodeCmd) -> anyhow::Result<()> {
    let pixels = load_pixels(&cmd.image, cmd.mode)
        .with_context(|| format!("failed to load {:?}", cmd.image))?;
    let config = ReduceConfig {
        threads: cmd.threads,
        crosses: cmd.crosses.unwrap_or(pixels.rows() as u32),
        threshold: cmd.threshold,
        mode: cmd.mode,
    };
    info!("{:?}", config);
    let grid = reduce(&pixels, &config).context("failed to reduce image")?;
    let written = if cmd.text {
        write_atomic(&cmd.output, to_text(&grid).as_bytes())
    } else {
        write_mosaic(&cmd.output, &grid)
    };
    written.with_context(|| format!("failed to write {:?}", cmd.output))
}

fn render_cmd(cmd: RenderCmd) -> anyhow::Result<()> {
    let grid = read_mosaic(&cmd.mosaic)
        .with_context(|| format!("failed to read {:?}", cmd.mosaic))?;
    let config = RenderConfig {
        cell_width: cmd.cell_width,
        cell_height: cmd.cell_height,
    };
    let image = render(&grid, &config).context("failed to render mosaic")?;
    let format = image::ImageFormat::from_path(&cmd.output)
        .with_context(|| format!("unknown image format for {:?}", cmd.output))?;
    let mut data = Cursor::new(Vec::new());
    image.write_to(&mut data, format).context("failed to encode image")?;
    write_atomic(&cmd.output, data.get_ref())
        .with_context(|| format!("failed to write {:?}", cmd.output))?;
    info!("rendered {}x{} image to {:?}", image.width(), image.height(), cmd.output);
    Ok(())
}

fn info_cmd(cmd: InfoCmd) -> anyhow::Result<()> {
    let data = std::fs::read(&cmd.mosaic)
        .with_context(|| format!("failed to read {:?}", cmd.mosaic))?;
    let header =
        decode_header(&mut ByteReader::from_slice(&data)).context("invalid mosaic header")?;
    println!("mode:    {:?}", header.mode);
    println!("threads: {}", header.threads);
    println!("crosses: {}", header.crosses);
    match header.payload_bits() {
        Some(bits) => println!("payload: {bits} bits"),
        None => println!("payload: invalid dimensions"),
    }
    println!("present: {} bits", (data.len() as u64 * 8).saturating_sub(HEADER_BITS));
    Ok(())
}

fn text_cmd(cmd: TextCmd) -> anyhow::Result<()> {
    let grid = read_mosaic(&cmd.mosaic)
        .with_context(|| format!("failed to read {:?}", cmd.mosaic))?;
    print!("{}", to_text(&grid));
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli: Cli = argh::from_env();
    match cli.command {
        Command::Encode(cmd) => encode(cmd),
        Command::Render(cmd) => render_cmd(cmd),
        Command::Info(cmd) => info_cmd(cmd),
        Command::Text(cmd) => text_cmd(cmd),
    }
}
