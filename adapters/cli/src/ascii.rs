use std::io::Write;

use anyhow::{Context, Result as AnyResult};
use geo_merge_rendering::{CellPresentation, RenderingBackend, Scene};

/// Width of a rendered cell column, marker excluded.
const COLUMN_WIDTH: usize = 6;

/// Backend that draws the neighbourhood of the player as text.
///
/// North is at the top. Out of range cells are wrapped in parentheses, empty
/// cells print `_`, unloaded coordinates print `.` and the player's cell is
/// suffixed with `@`.
#[derive(Debug)]
pub(crate) struct TerminalBackend<W> {
    writer: W,
    rows: i64,
    columns: i64,
}

impl<W: Write> TerminalBackend<W> {
    /// Creates a backend drawing `rows` cells north and south and `columns`
    /// cells east and west of the player.
    pub(crate) fn new(writer: W, rows: u16, columns: u16) -> Self {
        Self {
            writer,
            rows: i64::from(rows),
            columns: i64::from(columns),
        }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderingBackend for TerminalBackend<W> {
    fn present(&mut self, scene: &Scene) -> AnyResult<()> {
        let player = scene.player_cell();
        for di in (-self.rows..=self.rows).rev() {
            let mut line = String::new();
            for dj in -self.columns..=self.columns {
                let coord = player.offset(di, dj);
                line.push_str(&format_cell(scene.cell(coord), coord == player));
            }
            writeln!(self.writer, "{}", line.trim_end()).context("failed to draw map row")?;
        }

        writeln!(
            self.writer,
            "{}  wins: {}",
            scene.hud.token_counter(),
            scene.hud.wins
        )
        .context("failed to draw token counter")?;
        if let Some(banner) = &scene.hud.banner {
            writeln!(self.writer, "*** {banner} ***").context("failed to draw banner")?;
        }
        self.writer.flush().context("failed to flush map")
    }
}

fn format_cell(cell: Option<&CellPresentation>, player: bool) -> String {
    let body = match cell {
        None => ".".to_owned(),
        Some(cell) => {
            let label = cell.label.as_deref().unwrap_or("_");
            if cell.interactive {
                label.to_owned()
            } else {
                format!("({label})")
            }
        }
    };
    let marker = if player { '@' } else { ' ' };
    format!("{body:>COLUMN_WIDTH$}{marker}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_merge_core::{CellSnapshot, CellValue, CellView, GeoPoint, GridCoord, Token};
    use geo_merge_rendering::{Hud, WIN_BANNER};

    fn snapshot(i: i64, j: i64, value: u32, in_range: bool) -> CellSnapshot {
        CellSnapshot {
            coord: GridCoord::new(i, j),
            value: CellValue::from(Token::from_value(value)),
            in_range,
        }
    }

    fn render(scene: &Scene) -> String {
        let mut backend = TerminalBackend::new(Vec::new(), 1, 1);
        backend.present(scene).expect("write to vec");
        String::from_utf8(backend.into_inner()).expect("utf8")
    }

    #[test]
    fn draws_neighbourhood_north_up() {
        let view = CellView::from_snapshots(vec![
            snapshot(0, 0, 2, true),
            snapshot(1, 0, 0, true),
            snapshot(0, 1, 4, false),
        ]);
        let scene = Scene::new(&view, GeoPoint::new(0.5, 0.5), Hud::new(None, 0), 1.0)
            .expect("valid scene");

        let text = render(&scene);
        let rows: Vec<Vec<&str>> = text
            .lines()
            .map(|line| line.split_whitespace().collect())
            .collect();

        assert_eq!(rows[0], vec![".", "_", "."]);
        assert_eq!(rows[1], vec![".", "2@", "(4)"]);
        assert_eq!(rows[2], vec![".", ".", "."]);
        assert_eq!(text.lines().nth(3), Some("Tokens: 0  wins: 0"));
    }

    #[test]
    fn banner_follows_counter() {
        let scene = Scene::new(
            &CellView::default(),
            GeoPoint::new(0.5, 0.5),
            Hud::new(Token::from_value(2048), 1),
            1.0,
        )
        .expect("valid scene")
        .with_banner(WIN_BANNER);

        let text = render(&scene);
        let tail: Vec<&str> = text.lines().skip(3).collect();
        assert_eq!(tail, vec!["Tokens: 2048  wins: 1", "*** You Win! ***"]);
    }
}
