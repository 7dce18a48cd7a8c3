use crate::types::{Cut, Orientation, Piece, Rect};

const MAX_WIDTH: f64 = 100.0;
const MAX_HEIGHT: f64 = 40.0;

/// ASCII picture of the usable area with the placed pieces outlined and
/// labelled, and each cut drawn through the free stock with its order
/// number at its start.
pub fn render_layout(usable: Rect, pieces: &[Piece], cuts: &[Cut]) -> String {
    let scale = f64::min(MAX_WIDTH / usable.w, MAX_HEIGHT / usable.h);
    let grid_w = (usable.w * scale).round() as usize;
    let grid_h = (usable.h * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let to_col = |x: f64| ((x - usable.x).max(0.0) * scale).round() as usize;
    let to_row = |y: f64| ((y - usable.y).max(0.0) * scale).round() as usize;

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for piece in pieces {
        let Some(rect) = piece.rect() else { continue };
        let sx = to_col(rect.x);
        let sy = to_row(rect.y);
        let sw = (rect.w * scale).round() as usize;
        let sh = (rect.h * scale).round() as usize;

        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        let label = format!("#{} {}", piece.id, piece.size);
        let label = if label.len() + 1 < sw {
            label
        } else {
            format!("#{}", piece.id)
        };
        let label_chars: Vec<char> = label.chars().collect();

        if sw > 2 && sh > 0 {
            let cx = sx + sw / 2;
            let cy = sy + sh / 2;
            let half = label_chars.len() / 2;
            let start_x = cx.saturating_sub(half);

            for (i, &ch) in label_chars.iter().enumerate() {
                let x = start_x + i;
                if x > sx && x < sx + sw && cy > sy && cy < sy + sh {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    for cut in cuts {
        let ((x0, y0), (x1, y1)) = cut.endpoints();
        let (cells, mark): (Vec<(usize, usize)>, char) = match cut.orientation {
            Orientation::Horizontal => {
                let row = to_row(y0);
                ((to_col(x0)..=to_col(x1)).map(|c| (row, c)).collect(), '.')
            }
            Orientation::Vertical => {
                let col = to_col(x0);
                ((to_row(y0)..=to_row(y1)).map(|r| (r, col)).collect(), ':')
            }
        };
        for &(r, c) in &cells {
            if r < grid.len() && c < grid[r].len() && grid[r][c] == ' ' {
                grid[r][c] = mark;
            }
        }
        // Order number just inside the start of the line, where there is room.
        let digits: Vec<char> = cut.order.to_string().chars().collect();
        let slots: Vec<&(usize, usize)> = cells
            .iter()
            .filter(|&&(r, c)| r > 0 && c > 0 && r < grid_h && c < grid_w && grid[r][c] == mark)
            .take(digits.len())
            .collect();
        if slots.len() == digits.len() {
            for (&&(r, c), &d) in slots.iter().zip(&digits) {
                grid[r][c] = d;
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

#[allow(clippy::needless_range_loop)]
fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = if rows > 0 { grid[0].len() } else { return };

    // Horizontal edges
    for i in x..=x + w {
        if i < cols {
            for j in [y, y + h] {
                if j < rows {
                    grid[j][i] = if matches!(grid[j][i], '|' | '+') { '+' } else { '-' };
                }
            }
        }
    }

    // Vertical edges
    for j in y..=y + h {
        if j < rows {
            for i in [x, x + w] {
                if i < cols {
                    grid[j][i] = if matches!(grid[j][i], '-' | '+') { '+' } else { '|' };
                }
            }
        }
    }

    for &cx in &[x, x + w] {
        for &cy in &[y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::rebuild;
    use crate::types::Size;

    #[test]
    fn test_render_single_piece_with_cut() {
        let config = LayoutConfig::default();
        let pieces = vec![
            Piece::new(1, "A", Size::new(1000.0, 600.0)).placed_at(
                10.0,
                10.0,
                Some(Orientation::Vertical),
            ),
        ];
        let layout = rebuild(&pieces, &config);
        let output = render_layout(config.usable_area(), &pieces, &layout.cuts);

        assert!(output.contains("#1 1000x600"));
        assert!(output.contains(':'));
        assert!(output.contains('1'));
        assert!(output.contains('+'));
    }

    #[test]
    fn test_render_skips_pooled_pieces() {
        let config = LayoutConfig::default();
        let pieces = vec![Piece::new(7, "pooled", Size::new(1000.0, 600.0))];
        let output = render_layout(config.usable_area(), &pieces, &[]);
        assert!(!output.contains("#7"));
        // Board border is still drawn.
        assert!(output.starts_with('+'));
    }

    #[test]
    fn test_render_empty_area() {
        let output = render_layout(Rect::new(0.0, 0.0, 0.0, 0.0), &[], &[]);
        assert!(output.is_empty());
    }
}
