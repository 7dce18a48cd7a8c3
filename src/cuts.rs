use crate::geometry::spans_overlap;
use crate::types::{Cut, Orientation, PieceId, Rect};

/// Collects the cuts of one rebuild pass and hands them out deduplicated
/// and numbered.
#[derive(Debug, Clone)]
pub struct CutRecorder {
    usable: Rect,
    tolerance: f64,
    cuts: Vec<Cut>,
}

impl CutRecorder {
    pub fn new(usable: Rect, tolerance: f64) -> Self {
        Self {
            usable,
            tolerance,
            cuts: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        piece_id: PieceId,
        orientation: Orientation,
        position: f64,
        start: f64,
        end: f64,
    ) {
        self.cuts.push(Cut {
            orientation,
            position,
            start,
            end,
            order: 0,
            piece_id,
        });
    }

    /// Drops cuts on the usable-area border or outside it, collapses cuts
    /// at (nearly) the same line and span, sorts by position then span
    /// start, and numbers them from 1.
    pub fn finish(self) -> Vec<Cut> {
        let eps = self.tolerance;
        let usable = self.usable;
        let mut cuts: Vec<Cut> = Vec::with_capacity(self.cuts.len());

        for cut in self.cuts {
            let (low, high) = match cut.orientation {
                Orientation::Horizontal => (usable.y, usable.bottom()),
                Orientation::Vertical => (usable.x, usable.right()),
            };
            if cut.position <= low + eps || cut.position >= high - eps {
                continue;
            }
            let duplicate = cuts.iter().any(|kept| {
                kept.orientation == cut.orientation
                    && (kept.position - cut.position).abs() < eps
                    && (kept.start - cut.start).abs() < eps
                    && (kept.end - cut.end).abs() < eps
            });
            if !duplicate {
                cuts.push(cut);
            }
        }

        cuts.sort_by(|a, b| {
            a.position
                .total_cmp(&b.position)
                .then(a.start.total_cmp(&b.start))
                .then(a.orientation.cmp(&b.orientation))
        });
        for (i, cut) in cuts.iter_mut().enumerate() {
            cut.order = i + 1;
        }
        cuts
    }
}

/// First piece whose interior the given saw line would pass through.
/// A guillotine cut has to run edge to edge unobstructed.
pub fn first_obstruction(
    orientation: Orientation,
    position: f64,
    start: f64,
    end: f64,
    others: &[(PieceId, Rect)],
    eps: f64,
) -> Option<PieceId> {
    others
        .iter()
        .find(|(_, r)| match orientation {
            Orientation::Vertical => {
                r.x + eps < position
                    && position < r.right() - eps
                    && spans_overlap(r.y, r.bottom(), start, end, eps)
            }
            Orientation::Horizontal => {
                r.y + eps < position
                    && position < r.bottom() - eps
                    && spans_overlap(r.x, r.right(), start, end, eps)
            }
        })
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> CutRecorder {
        CutRecorder::new(Rect::new(10.0, 10.0, 2750.0, 1830.0), 1.0)
    }

    #[test]
    fn test_orders_by_position_then_start() {
        let mut rec = recorder();
        rec.record(3, Orientation::Horizontal, 713.0, 10.0, 2760.0);
        rec.record(1, Orientation::Horizontal, 311.5, 10.0, 2760.0);
        rec.record(2, Orientation::Vertical, 311.5, 10.0, 310.0);
        rec.record(4, Orientation::Vertical, 913.0, 10.0, 310.0);
        rec.record(5, Orientation::Vertical, 311.5, 5.0, 310.0);

        let cuts = rec.finish();
        let summary: Vec<(PieceId, usize)> = cuts.iter().map(|c| (c.piece_id, c.order)).collect();
        assert_eq!(summary, vec![(5, 1), (1, 2), (2, 3), (3, 4), (4, 5)]);
    }

    #[test]
    fn test_dedupes_same_line_and_span() {
        let mut rec = recorder();
        rec.record(1, Orientation::Vertical, 411.5, 10.0, 1840.0);
        rec.record(2, Orientation::Vertical, 411.9, 10.2, 1840.0);
        rec.record(3, Orientation::Vertical, 411.5, 311.5, 1840.0);
        rec.record(4, Orientation::Horizontal, 411.5, 10.0, 1840.0);

        let cuts = rec.finish();
        assert_eq!(cuts.len(), 3);
        assert!(cuts.iter().all(|c| c.piece_id != 2));
    }

    #[test]
    fn test_drops_cuts_on_or_outside_border() {
        let mut rec = recorder();
        rec.record(1, Orientation::Horizontal, 1840.0, 10.0, 2760.0);
        rec.record(2, Orientation::Vertical, 10.0, 10.0, 1840.0);
        rec.record(3, Orientation::Vertical, 3000.0, 10.0, 1840.0);
        rec.record(4, Orientation::Vertical, 1000.0, 10.0, 1840.0);
        let cuts = rec.finish();
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].piece_id, 4);
        assert_eq!(cuts[0].order, 1);
    }

    #[test]
    fn test_obstruction_along_cut_span() {
        let others = vec![(7, Rect::new(300.0, 700.0, 300.0, 300.0))];
        // x = 410 crosses the piece at 300..600 somewhere in y 10..1840.
        assert_eq!(
            first_obstruction(Orientation::Vertical, 410.0, 10.0, 1840.0, &others, 1.0),
            Some(7)
        );
        // Span that stops above the piece.
        assert_eq!(
            first_obstruction(Orientation::Vertical, 410.0, 10.0, 650.0, &others, 1.0),
            None
        );
        // Line along the piece's edge is fine.
        assert_eq!(
            first_obstruction(Orientation::Vertical, 600.0, 10.0, 1840.0, &others, 1.0),
            None
        );
        assert_eq!(
            first_obstruction(Orientation::Horizontal, 800.0, 10.0, 2760.0, &others, 1.0),
            Some(7)
        );
    }
}
