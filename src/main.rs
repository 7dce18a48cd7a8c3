use clap::Parser;
use guillotine_editor::config::{DefaultOrientation, LayoutConfig};
use guillotine_editor::editor::Editor;
use guillotine_editor::pattern::Pattern;
use guillotine_editor::render;
use guillotine_editor::types::Size;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "guillotine_editor",
    about = "Guillotine cutting layout editor: place pieces, get ordered cuts"
)]
struct Cli {
    /// Board dimensions (WxH, e.g. 2750x1830)
    #[arg(long, default_value = "2750x1830", value_parser = parse_size)]
    board: Size,

    /// Blade kerf width in mm
    #[arg(long, default_value_t = 1.5)]
    kerf: f64,

    /// Offset of the usable area from the board frame
    #[arg(long, default_value_t = 10.0)]
    margin: f64,

    /// Snap radius in mm
    #[arg(long, default_value_t = 30.0)]
    snap_tolerance: f64,

    /// Regions smaller than this on either side are scrap
    #[arg(long, default_value_t = 30.0)]
    min_region: f64,

    /// Smallest piece side worth cutting
    #[arg(long, default_value_t = 50.0)]
    min_piece: f64,

    /// Default cut orientation: horizontal, vertical or alternate (by split depth)
    #[arg(long, default_value = "horizontal", value_parser = parse_orientation)]
    orientation: DefaultOrientation,

    /// Pattern file with pre-positioned parts (JSON)
    #[arg(long)]
    pattern: Option<String>,

    /// Which sheet layout of the pattern to load
    #[arg(long, default_value_t = 0)]
    pattern_layout: usize,

    /// Pieces to drop on the board, in order, as WxH@X,Y (e.g. 400x300@10,10)
    #[arg(long = "place", num_args = 1..)]
    place: Vec<String>,

    /// Show ASCII layout of the board
    #[arg(long)]
    layout: bool,

    /// Log every rebuild step to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_orientation(s: &str) -> Result<DefaultOrientation, String> {
    match s {
        "horizontal" | "h" => Ok(DefaultOrientation::Horizontal),
        "vertical" | "v" => Ok(DefaultOrientation::Vertical),
        "alternate" | "a" => Ok(DefaultOrientation::Alternate),
        _ => Err(format!(
            "invalid orientation '{}', expected: horizontal, vertical or alternate",
            s
        )),
    }
}

fn parse_number(s: &str, what: &str, whole: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid {} in '{}'", what, whole))
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("invalid dimensions '{}', expected WxH", s))?;
    let size = Size::new(parse_number(w, "width", s)?, parse_number(h, "height", s)?);
    if size.w <= 0.0 || size.h <= 0.0 {
        return Err(format!("dimensions must be positive in '{}'", s));
    }
    Ok(size)
}

fn parse_place(s: &str) -> Result<(Size, f64, f64), String> {
    let (size, at) = s
        .split_once('@')
        .ok_or_else(|| format!("invalid placement '{}', expected WxH@X,Y", s))?;
    let (x, y) = at
        .split_once(',')
        .ok_or_else(|| format!("invalid position in '{}', expected X,Y", s))?;
    Ok((
        parse_size(size)?,
        parse_number(x, "x", s)?,
        parse_number(y, "y", s)?,
    ))
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let drops: Vec<(Size, f64, f64)> = cli
        .place
        .iter()
        .map(|p| parse_place(p))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| fail(e));

    let config = LayoutConfig {
        width: cli.board.w,
        height: cli.board.h,
        kerf: cli.kerf,
        margin: cli.margin,
        snap_tolerance: cli.snap_tolerance,
        min_region_size: cli.min_region,
        min_piece_size: cli.min_piece,
        default_orientation: cli.orientation,
        ..Default::default()
    };

    let mut editor = match &cli.pattern {
        Some(path) => {
            let pattern = Pattern::from_path(path).unwrap_or_else(|e| fail(e));
            let sheet = pattern
                .layout(cli.pattern_layout)
                .unwrap_or_else(|e| fail(e));
            let config = sheet.config(&config).unwrap_or_else(|e| fail(e));
            let pieces = sheet.pieces(&config).unwrap_or_else(|e| fail(e));
            println!(
                "Loaded {} parts from {} (layout {} of {})",
                pieces.len(),
                path,
                cli.pattern_layout + 1,
                pattern.layouts().len()
            );
            Editor::with_pieces(config, pieces)
        }
        None => Editor::new(config),
    }
    .unwrap_or_else(|e| fail(e));

    for (i, (size, x, y)) in drops.into_iter().enumerate() {
        let id = editor.add_piece(format!("drop {}", i + 1), size);
        match editor.place(id, x, y) {
            Ok(placed) => println!(
                "Piece #{} {} @ ({}, {}): placed, {} cut",
                id, size, placed.x, placed.y, placed.orientation
            ),
            Err(e) => println!("Piece #{} {} @ ({}, {}): rejected, {}", id, size, x, y, e),
        }
    }

    let layout = editor.layout();
    println!();
    println!("Cuts:");
    for cut in &layout.cuts {
        println!("  {} (piece #{}, {} mm)", cut, cut.piece_id, cut.length());
    }
    println!("Free regions:");
    for region in &layout.regions {
        println!("  {} @ ({}, {})", region.size, region.x, region.y);
    }

    let excluded: Vec<_> = layout.excluded().collect();
    if !excluded.is_empty() {
        println!("Pieces without a cut:");
        for record in excluded {
            println!("  #{}: {:?}", record.piece_id, record.status);
        }
    }

    if cli.layout {
        println!();
        print!(
            "{}",
            render::render_layout(editor.config().usable_area(), editor.pieces(), &layout.cuts)
        );
    }

    println!();
    println!(
        "Summary: {} piece{} placed, {} in pool, {} cut{}",
        editor.placed().count(),
        if editor.placed().count() == 1 { "" } else { "s" },
        editor.pool().count(),
        layout.cuts.len(),
        if layout.cuts.len() == 1 { "" } else { "s" },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_place() {
        assert_eq!(
            parse_place("400x300@10,10"),
            Ok((Size::new(400.0, 300.0), 10.0, 10.0))
        );
        assert_eq!(
            parse_place("500x300@411.5, 10"),
            Ok((Size::new(500.0, 300.0), 411.5, 10.0))
        );
        assert!(parse_place("400x300").is_err());
        assert!(parse_place("400x300@10").is_err());
        assert!(parse_place("0x300@10,10").is_err());
        assert!(parse_place("axb@1,1").is_err());
    }

    #[test]
    fn test_parse_orientation() {
        assert_eq!(parse_orientation("vertical"), Ok(DefaultOrientation::Vertical));
        assert_eq!(parse_orientation("h"), Ok(DefaultOrientation::Horizontal));
        assert_eq!(parse_orientation("alternate"), Ok(DefaultOrientation::Alternate));
        assert!(parse_orientation("diagonal").is_err());
    }
}
