use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};

use weft_core::coords::PxRect;
use weft_core::render::{build_draw_list, DrawCmd, LineEmphasis, Overlay};
use weft_core::state::note::{pitch_name, NoteKind};
use weft_core::{EditMode, SequencerState};

use super::GridPane;

const BG: Color = Color::Rgb(16, 14, 24);
const BG_ACCENT: Color = Color::Rgb(26, 22, 38);
const LINE_STEP: Color = Color::Rgb(44, 38, 60);
const LINE_BEAT: Color = Color::Rgb(70, 60, 95);
const LINE_CYCLE: Color = Color::Rgb(120, 100, 160);
const NOTE: Color = Color::Rgb(90, 160, 220);
const NOTE_SELECTED: Color = Color::Rgb(240, 200, 90);
const GHOST: Color = Color::Rgb(60, 90, 120);
const PLAYHEAD: Color = Color::Rgb(120, 230, 150);
const CURSOR: Color = Color::Rgb(200, 120, 200);

impl GridPane {
    pub fn render(
        &mut self,
        buf: &mut Buffer,
        area: Rect,
        seq: &SequencerState,
        playhead: Option<f64>,
        compiled: &str,
        help: &str,
    ) {
        if area.height < 3 || area.width == 0 {
            return;
        }
        let header = Rect::new(area.x, area.y, area.width, 1);
        let footer = Rect::new(area.x, area.y + area.height - 1, area.width, 1);
        self.grid_area = Rect::new(area.x, area.y + 1, area.width, area.height - 2);

        self.render_header(buf, header, seq);
        self.render_grid(buf, seq, playhead);
        self.render_footer(buf, footer, compiled, help);
    }

    fn render_header(&self, buf: &mut Buffer, area: Rect, seq: &SequencerState) {
        let mode = match seq.mode {
            EditMode::Melodic => "melodic",
            EditMode::Percussive => "drums",
        };
        let text = format!(
            " {}  grid {}  cycles {}/{}  {}",
            mode,
            seq.quantize.label(),
            seq.used_cycles(),
            seq.pattern_cycles,
            if seq.playing { "▶ playing" } else { "■ stopped" },
        );
        buf.set_stringn(
            area.x,
            area.y,
            &text,
            area.width as usize,
            Style::default().add_modifier(Modifier::BOLD),
        );
    }

    fn render_footer(&self, buf: &mut Buffer, area: Rect, compiled: &str, help: &str) {
        let text = if compiled.is_empty() {
            format!(" {help}")
        } else {
            format!(" {compiled}")
        };
        buf.set_stringn(
            area.x,
            area.y,
            &text,
            area.width as usize,
            Style::default().fg(Color::Rgb(150, 150, 160)),
        );
    }

    fn render_grid(&self, buf: &mut Buffer, seq: &SequencerState, playhead: Option<f64>) {
        let overlay = Overlay {
            ghosts: self.pointer.ghosts(),
            select_box: self.pointer.box_rect(),
        };
        for cmd in build_draw_list(seq, &overlay, self.canvas, playhead) {
            match cmd {
                DrawCmd::RowBand { rect, accent } => {
                    let bg = if accent { BG_ACCENT } else { BG };
                    self.fill(buf, &rect, ' ', Style::default().bg(bg));
                }
                DrawCmd::GridLine { x, emphasis } => {
                    let color = match emphasis {
                        LineEmphasis::Step => LINE_STEP,
                        LineEmphasis::Beat => LINE_BEAT,
                        LineEmphasis::Cycle => LINE_CYCLE,
                    };
                    self.vline(buf, x, '│', Style::default().fg(color));
                }
                DrawCmd::Note {
                    rect,
                    kind,
                    selected,
                } => {
                    let color = if selected { NOTE_SELECTED } else { NOTE };
                    self.fill(buf, &rect, '█', Style::default().fg(color));
                    self.label(buf, &rect, &note_label(kind), Style::default().fg(Color::Black).bg(color));
                }
                DrawCmd::Ghost { rect, .. } => {
                    self.fill(buf, &rect, '▒', Style::default().fg(GHOST));
                }
                DrawCmd::SelectBox { rect } => {
                    self.outline(buf, &rect, Style::default().fg(NOTE_SELECTED));
                }
                DrawCmd::PasteCursor { x } => {
                    self.vline(buf, x, '┆', Style::default().fg(CURSOR));
                }
                DrawCmd::Playhead { x } => {
                    self.vline(buf, x, '┃', Style::default().fg(PLAYHEAD));
                }
            }
        }
    }

    /// Logical-pixel rect to a clamped cell range inside the grid area.
    fn cells(&self, rect: &PxRect) -> Option<(u16, u16, u16, u16)> {
        let area = self.grid_area;
        let cols = area.width as f32;
        let rows = area.height as f32;
        let x0 = (rect.x / self.canvas.width * cols).floor().max(0.0) as i32;
        let x1 = ((rect.x + rect.w) / self.canvas.width * cols).ceil() as i32;
        let y0 = (rect.y / self.canvas.height * rows).floor().max(0.0) as i32;
        let y1 = ((rect.y + rect.h) / self.canvas.height * rows).ceil() as i32;
        let x1 = x1.min(area.width as i32);
        let y1 = y1.min(area.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((
            area.x + x0 as u16,
            area.x + x1 as u16,
            area.y + y0 as u16,
            area.y + y1 as u16,
        ))
    }

    fn fill(&self, buf: &mut Buffer, rect: &PxRect, ch: char, style: Style) {
        let Some((x0, x1, y0, y1)) = self.cells(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    if ch != ' ' {
                        cell.set_char(ch);
                    }
                    cell.set_style(style);
                }
            }
        }
    }

    fn label(&self, buf: &mut Buffer, rect: &PxRect, text: &str, style: Style) {
        let Some((x0, x1, y0, _)) = self.cells(rect) else {
            return;
        };
        let width = (x1 - x0) as usize;
        if width >= text.len() {
            buf.set_stringn(x0, y0, text, width, style);
        }
    }

    fn outline(&self, buf: &mut Buffer, rect: &PxRect, style: Style) {
        let Some((x0, x1, y0, y1)) = self.cells(rect) else {
            return;
        };
        for x in x0..x1 {
            for y in [y0, y1 - 1] {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char('·');
                    cell.set_style(style);
                }
            }
        }
        for y in y0..y1 {
            for x in [x0, x1 - 1] {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char('·');
                    cell.set_style(style);
                }
            }
        }
    }

    fn vline(&self, buf: &mut Buffer, px_x: f32, ch: char, style: Style) {
        let area = self.grid_area;
        let col = (px_x / self.canvas.width * area.width as f32).floor() as i32;
        if col < 0 || col >= area.width as i32 {
            return;
        }
        let x = area.x + col as u16;
        for y in area.y..area.y + area.height {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(ch);
                cell.set_style(style);
            }
        }
    }
}

fn note_label(kind: NoteKind) -> String {
    match kind {
        NoteKind::Melodic { pitch } => pitch_name(pitch),
        NoteKind::Percussive { voice } => voice.label().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::state::note::NoteKind;

    #[test]
    fn render_paints_notes_into_the_buffer() {
        let mut pane = GridPane::new();
        let mut seq = SequencerState::new();
        {
            let v = seq.view_mut();
            v.start_slot = 0.0;
            v.span_slots = 96.0;
            v.bottom_row = 55.0;
            v.visible_rows = 12.0;
        }
        seq.store_mut().create(0, 48, NoteKind::Melodic { pitch: 60 });

        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        pane.render(&mut buf, area, &seq, None, "note(\"c4@4 ~@4\")", "");

        let painted = buf
            .content()
            .iter()
            .filter(|cell| cell.symbol() == "█")
            .count();
        assert!(painted > 0, "note body should be painted");
        // Footer carries the compiled text
        let footer: String = (0..40)
            .filter_map(|x| buf.cell((x, 23)).map(|c| c.symbol().to_string()))
            .collect();
        assert!(footer.contains("note("));
    }

    #[test]
    fn header_shows_used_and_configured_cycles() {
        let mut pane = GridPane::new();
        let mut seq = SequencerState::new();
        seq.set_pattern_cycles(4);
        // Notes reach into the second cycle
        seq.store_mut().create(0, 48, NoteKind::Melodic { pitch: 60 });
        seq.store_mut().create(96, 144, NoteKind::Melodic { pitch: 64 });

        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        pane.render(&mut buf, area, &seq, None, "", "q quit");

        let header: String = (0..40)
            .filter_map(|x| buf.cell((x, 0)).map(|c| c.symbol().to_string()))
            .collect();
        assert!(header.contains("cycles 2/4"), "header was: {header}");
        let footer: String = (0..40)
            .filter_map(|x| buf.cell((x, 23)).map(|c| c.symbol().to_string()))
            .collect();
        assert!(footer.contains("q quit"));
    }
}
