//! Renders a generated jigsaw cut pattern for printing or inspection:
//! the board seam pattern, a laid-out sheet of individual piece outlines,
//! or the raw descriptor list as JSON.

use std::env;
use std::error::Error;
use std::fs;

use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use jigsaw_core::{
    build_piece_path, generate, grid_overlay_path, piece_color, PieceDescriptor, KNOB_RATIO,
};

const MARGIN: f64 = 10.0;
const SHEET_GAP: f64 = 8.0;
const PIECE_PAD: f64 = 2.0;

/// JSON dump of one generated cut.
#[derive(Serialize)]
struct CutSheet {
    rows: u32,
    cols: u32,
    size_px: f64,
    seed: u64,
    pieces: Vec<PieceDescriptor>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let pieces_mode = args.iter().any(|a| a == "--pieces");
    args.retain(|a| a != "--pieces");
    if args.len() < 3 {
        eprintln!(
            "Usage: cutsheet [--pieces] <rows>x<cols> <size_px> <output.(svg|png|json)> [seed]"
        );
        std::process::exit(2);
    }
    let (rows, cols) = parse_grid(&args[0])?;
    let size_px: f64 = args[1]
        .parse()
        .map_err(|_| format!("invalid size: {}", args[1]))?;
    if size_px <= 0.0 {
        return Err("size must be positive".into());
    }
    let output = &args[2];
    let seed: u64 = match args.get(3) {
        Some(s) => s.parse().map_err(|_| format!("invalid seed: {s}"))?,
        None => rand::random(),
    };
    eprintln!("cut seed: {seed}");

    let descriptors = generate(rows, cols, &mut Pcg32::seed_from_u64(seed));

    if output.ends_with(".json") {
        let sheet = CutSheet {
            rows,
            cols,
            size_px,
            seed,
            pieces: descriptors,
        };
        fs::write(output, serde_json::to_string_pretty(&sheet)?)?;
        return Ok(());
    }

    let (svg, w_px, h_px) = if pieces_mode {
        build_piece_sheet_svg(&descriptors, rows, cols, size_px)
    } else {
        if rows != cols {
            return Err("board mode needs a square grid; use --pieces for NxM".into());
        }
        build_board_svg(&descriptors, rows, size_px)
    };

    if output.ends_with(".svg") {
        fs::write(output, svg)?;
        return Ok(());
    }
    if !output.ends_with(".png") {
        return Err(format!("unsupported output format: {output}").into());
    }

    // PNG: render SVG -> RGBA and save (deterministic)
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(&svg, &opt).map_err(|e| format!("SVG parse error: {e:?}"))?;
    let mut pixmap = tiny_skia::Pixmap::new(w_px, h_px).ok_or("pixmap alloc failed")?;
    let mut pm = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pm);
    encode_png_deterministic(&pixmap, output)?;
    Ok(())
}

fn parse_grid(s: &str) -> Result<(u32, u32), String> {
    let (r, c) = s
        .split_once('x')
        .ok_or_else(|| format!("invalid grid '{s}', expected <rows>x<cols>"))?;
    let rows: u32 = r.parse().map_err(|_| format!("invalid row count '{r}'"))?;
    let cols: u32 = c.parse().map_err(|_| format!("invalid column count '{c}'"))?;
    if rows == 0 || cols == 0 {
        return Err("grid must be at least 1x1".to_string());
    }
    Ok((rows, cols))
}

fn svg_open(w_px: u32, h_px: u32) -> String {
    let mut s = String::new();
    s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    s.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" stroke=\"#111\" fill=\"none\" stroke-width=\"1.5\" stroke-linejoin=\"round\">\n",
        w_px, h_px, w_px, h_px
    ));
    s.push_str("<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");
    s
}

/// The assembled board: outer border plus every interior seam.
fn build_board_svg(descriptors: &[PieceDescriptor], grid: u32, size_px: f64) -> (String, u32, u32) {
    let w_px = (size_px + 2.0 * MARGIN).ceil() as u32;
    let mut s = svg_open(w_px, w_px);
    s.push_str(&format!(
        "<rect x=\"{m:.2}\" y=\"{m:.2}\" width=\"{sz:.2}\" height=\"{sz:.2}\"/>\n",
        m = MARGIN,
        sz = size_px
    ));
    s.push_str(&format!(
        "<path transform=\"translate({m:.2} {m:.2})\" d=\"{}\"/>\n",
        grid_overlay_path(size_px, grid, descriptors),
        m = MARGIN
    ));
    s.push_str("</svg>\n");
    (s, w_px, w_px)
}

/// Every piece outline on its own, laid out on the grid with gaps, tinted by
/// the stable palette so neighbors are easy to tell apart.
fn build_piece_sheet_svg(
    descriptors: &[PieceDescriptor],
    rows: u32,
    cols: u32,
    size_px: f64,
) -> (String, u32, u32) {
    let ps = size_px / cols as f64;
    // Worst-case inflated box: knobs on both opposite sides.
    let cell = ps * (1.0 + 2.0 * KNOB_RATIO) + 2.0 * PIECE_PAD;
    let w_px = (cols as f64 * (cell + SHEET_GAP) + SHEET_GAP).ceil() as u32;
    let h_px = (rows as f64 * (cell + SHEET_GAP) + SHEET_GAP).ceil() as u32;
    let mut s = svg_open(w_px, h_px);
    for (i, d) in descriptors.iter().enumerate() {
        let pd = build_piece_path(ps, ps, d.edges, PIECE_PAD);
        let x = SHEET_GAP + d.col as f64 * (cell + SHEET_GAP) + (cell - pd.width) / 2.0;
        let y = SHEET_GAP + d.row as f64 * (cell + SHEET_GAP) + (cell - pd.height) / 2.0;
        s.push_str(&format!(
            "<path transform=\"translate({x:.2} {y:.2})\" d=\"{}\" fill=\"{}\" fill-opacity=\"0.25\"/>\n",
            pd.path,
            piece_color(i)
        ));
    }
    s.push_str("</svg>\n");
    (s, w_px, h_px)
}

fn encode_png_deterministic(
    pixmap: &tiny_skia::Pixmap,
    path: &str,
) -> Result<(), Box<dyn Error>> {
    let file = std::fs::File::create(path)?;
    let w = pixmap.width();
    let h = pixmap.height();
    let mut enc = Encoder::new(file, w, h);
    enc.set_color(ColorType::Rgba);
    enc.set_depth(BitDepth::Eight);
    enc.set_filter(FilterType::NoFilter);
    enc.set_compression(Compression::Default);
    let mut writer = enc.write_header()?;
    writer.write_image_data(pixmap.data())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grid() {
        assert_eq!(parse_grid("4x4"), Ok((4, 4)));
        assert_eq!(parse_grid("3x5"), Ok((3, 5)));
        assert!(parse_grid("4").is_err());
        assert!(parse_grid("0x4").is_err());
        assert!(parse_grid("x4").is_err());
    }

    #[test]
    fn test_board_svg_is_deterministic_for_a_seed() {
        let a = generate(4, 4, &mut Pcg32::seed_from_u64(7));
        let b = generate(4, 4, &mut Pcg32::seed_from_u64(7));
        assert_eq!(build_board_svg(&a, 4, 400.0), build_board_svg(&b, 4, 400.0));
    }

    #[test]
    fn test_piece_sheet_has_one_path_per_piece() {
        let d = generate(3, 3, &mut Pcg32::seed_from_u64(1));
        let (svg, _, _) = build_piece_sheet_svg(&d, 3, 3, 300.0);
        assert_eq!(svg.matches("<path transform").count(), 9);
    }
}
