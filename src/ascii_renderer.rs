use crate::diagram::Point;
use crate::draw::*;
use crate::text::{display_width, truncate, wrap};

/// Diagram units per character column and row at the natural size.
const UNITS_PER_COL: f64 = 6.0;
const UNITS_PER_ROW: f64 = 25.0;
const MIN_BOX_WIDTH: usize = 5;
const MIN_BOX_HEIGHT: usize = 3;
const MIN_PANEL_WIDTH: usize = 40;
/// Grid bounds for diagrams drawn without a width limit, or spread too far
/// apart to draw at natural size.
const MAX_COLUMNS: usize = 1000;
const MAX_ROWS: usize = 400;

struct Grid {
    cells: Vec<Vec<char>>,
    width: usize,
    height: usize,
}

impl Grid {
    fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![vec![' '; width]; height],
            width,
            height,
        }
    }

    fn set(&mut self, row: usize, col: usize, ch: char) {
        if row < self.height && col < self.width {
            if self.cells[row][col] == '\0' && col > 0 && self.cells[row][col - 1] != '\0' {
                self.cells[row][col - 1] = ' ';
            }
            self.cells[row][col] = ch;
        }
    }

    fn write_str(&mut self, row: usize, col: usize, s: &str) {
        let mut offset = 0;
        for ch in s.chars() {
            self.set(row, col + offset, ch);
            let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(1);
            for j in 1..w {
                self.set(row, col + offset + j, '\0');
            }
            offset += w;
        }
    }

    fn set_merge(&mut self, row: usize, col: usize, ch: char) {
        if row < self.height && col < self.width {
            let existing = self.cells[row][col];
            let merged = merge_box_drawing(existing, ch);
            self.set(row, col, merged);
        }
    }

    fn lines(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| {
                let line: String = row.iter().filter(|&&ch| ch != '\0').collect();
                line.trim_end().to_string()
            })
            .collect()
    }
}

/// Box characters: corners, horizontal, vertical.
struct BoxStyle {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    vertical: char,
}

const PLAIN: BoxStyle = BoxStyle {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
};

const HEAVY: BoxStyle = BoxStyle {
    top_left: '┏',
    top_right: '┓',
    bottom_left: '┗',
    bottom_right: '┛',
    horizontal: '━',
    vertical: '┃',
};

/// Maps diagram coordinates onto grid cells.
struct CellMap {
    origin: Point,
    units_per_col: f64,
    units_per_row: f64,
}

impl CellMap {
    fn col(&self, x: f64) -> usize {
        ((x - self.origin.x) / self.units_per_col).round().max(0.0) as usize
    }

    fn row(&self, y: f64) -> usize {
        ((y - self.origin.y) / self.units_per_row).round().max(0.0) as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct CellBox {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

pub fn render(list: &DrawList) -> String {
    render_with_options(list, None)
}

pub fn render_with_options(list: &DrawList, max_width: Option<usize>) -> String {
    let mut lines = header_lines(list, max_width);

    if !list.nodes.is_empty() {
        let map = cell_map(list, max_width);
        let boxes: Vec<CellBox> = list.nodes.iter().map(|n| cell_box(&map, &n.rect)).collect();

        let mut width = boxes.iter().map(|b| b.x.saturating_add(b.width)).max().unwrap_or(0);
        let mut height = boxes.iter().map(|b| b.y.saturating_add(b.height)).max().unwrap_or(0);
        for c in &list.connectors {
            width = width
                .max(map.col(c.start.x).saturating_add(1))
                .max(map.col(c.end.x).saturating_add(1));
            height = height
                .max(map.row(c.start.y).saturating_add(1))
                .max(map.row(c.end.y).saturating_add(1));
        }

        let mut grid = Grid::new(width, height);
        for c in &list.connectors {
            draw_connector(&mut grid, &map, c);
        }
        for (node, b) in list.nodes.iter().zip(&boxes) {
            let style = if node.highlighted { &HEAVY } else { &PLAIN };
            draw_box(&mut grid, b, &node.label, style);
        }

        lines.push(String::new());
        lines.extend(grid.lines());
    }

    if let Some(panel) = &list.detail {
        lines.push(String::new());
        lines.extend(detail_lines(panel, max_width));
    }

    lines.join("\n")
}

fn header_lines(list: &DrawList, max_width: Option<usize>) -> Vec<String> {
    let text_width = max_width.unwrap_or(usize::MAX);
    let mut lines = vec![truncate(&list.title, text_width)];
    if let Some(summary) = &list.summary {
        lines.extend(wrap(summary, max_width.unwrap_or(80)));
    }
    match (list.zoom, list.rotation) {
        (Some(zoom), Some(rotation)) => {
            lines.push(truncate(&format!("Zoom: {zoom}%  Rotation: {rotation}°"), text_width));
        }
        (Some(zoom), None) => lines.push(truncate(&format!("Zoom: {zoom}%"), text_width)),
        _ => {}
    }
    lines
}

fn cell_map(list: &DrawList, max_width: Option<usize>) -> CellMap {
    let mut points: Vec<Point> = Vec::new();
    for n in &list.nodes {
        points.push(Point::new(n.rect.x, n.rect.y));
        points.push(Point::new(n.rect.right(), n.rect.bottom()));
    }
    for c in &list.connectors {
        points.push(c.start);
        points.push(c.end);
    }
    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    // Rows are already coarse and only shrink once the grid would be huge.
    let columns = max_width.map_or(MAX_COLUMNS, |w| w.min(MAX_COLUMNS));
    CellMap {
        origin: Point::new(min_x, min_y),
        units_per_col: UNITS_PER_COL * fit_factor((max_x - min_x) / UNITS_PER_COL, columns),
        units_per_row: UNITS_PER_ROW * fit_factor((max_y - min_y) / UNITS_PER_ROW, MAX_ROWS),
    }
}

/// How much to stretch the unit size so `natural` cells fit in `limit`.
fn fit_factor(natural: f64, limit: usize) -> f64 {
    let available = limit.saturating_sub(1).max(1) as f64;
    if natural > available {
        natural / available
    } else {
        1.0
    }
}

fn cell_box(map: &CellMap, rect: &Rect) -> CellBox {
    let x = map.col(rect.x);
    let y = map.row(rect.y);
    CellBox {
        x,
        y,
        width: map.col(rect.right()).saturating_sub(x).max(MIN_BOX_WIDTH),
        height: map.row(rect.bottom()).saturating_sub(y).max(MIN_BOX_HEIGHT),
    }
}

fn draw_box(grid: &mut Grid, b: &CellBox, label: &str, style: &BoxStyle) {
    let (x, y, w, h) = (b.x, b.y, b.width, b.height);

    grid.set(y, x, style.top_left);
    for col in (x + 1)..(x + w - 1) {
        grid.set(y, col, style.horizontal);
    }
    grid.set(y, x + w - 1, style.top_right);

    for row in (y + 1)..(y + h - 1) {
        grid.set(row, x, style.vertical);
        for col in (x + 1)..(x + w - 1) {
            grid.set(row, col, ' ');
        }
        grid.set(row, x + w - 1, style.vertical);
    }

    grid.set(y + h - 1, x, style.bottom_left);
    for col in (x + 1)..(x + w - 1) {
        grid.set(y + h - 1, col, style.horizontal);
    }
    grid.set(y + h - 1, x + w - 1, style.bottom_right);

    let text = truncate(label, w.saturating_sub(4));
    grid.write_str(y + h / 2, x + 2, &text);
}

const DIR_L: u8 = 1;
const DIR_R: u8 = 2;
const DIR_U: u8 = 4;
const DIR_D: u8 = 8;

fn box_connections(ch: char) -> u8 {
    match ch {
        '─' => DIR_L | DIR_R,
        '│' => DIR_U | DIR_D,
        '┌' => DIR_R | DIR_D,
        '┐' => DIR_L | DIR_D,
        '└' => DIR_R | DIR_U,
        '┘' => DIR_L | DIR_U,
        '┬' => DIR_L | DIR_R | DIR_D,
        '┴' => DIR_L | DIR_R | DIR_U,
        '├' => DIR_U | DIR_D | DIR_R,
        '┤' => DIR_U | DIR_D | DIR_L,
        '┼' => DIR_L | DIR_R | DIR_U | DIR_D,
        _ => 0,
    }
}

fn connections_to_char(conn: u8) -> Option<char> {
    match conn {
        c if c == DIR_L | DIR_R => Some('─'),
        c if c == DIR_U | DIR_D => Some('│'),
        c if c == DIR_R | DIR_D => Some('┌'),
        c if c == DIR_L | DIR_D => Some('┐'),
        c if c == DIR_R | DIR_U => Some('└'),
        c if c == DIR_L | DIR_U => Some('┘'),
        c if c == DIR_L | DIR_R | DIR_D => Some('┬'),
        c if c == DIR_L | DIR_R | DIR_U => Some('┴'),
        c if c == DIR_U | DIR_D | DIR_R => Some('├'),
        c if c == DIR_U | DIR_D | DIR_L => Some('┤'),
        c if c == DIR_L | DIR_R | DIR_U | DIR_D => Some('┼'),
        _ => None,
    }
}

fn merge_box_drawing(existing: char, new_char: char) -> char {
    let ec = box_connections(existing);
    let nc = box_connections(new_char);
    if ec == 0 {
        return new_char;
    }
    connections_to_char(ec | nc).unwrap_or(new_char)
}

fn hline(grid: &mut Grid, row: usize, a: usize, b: usize) {
    for col in a.min(b)..=a.max(b) {
        grid.set_merge(row, col, '─');
    }
}

fn vline(grid: &mut Grid, col: usize, a: usize, b: usize) {
    for row in a.min(b)..=a.max(b) {
        grid.set_merge(row, col, '│');
    }
}

fn draw_connector(grid: &mut Grid, map: &CellMap, c: &Connector) {
    let (sc, sr) = (map.col(c.start.x), map.row(c.start.y));
    let (ec, er) = (map.col(c.end.x), map.row(c.end.y));

    // The arrowhead takes the cell just outside the target box.
    let rightward = ec >= sc;
    let tip = if rightward { ec.saturating_sub(1) } else { ec + 1 };
    let arrow = if rightward { '>' } else { '<' };

    if sr == er {
        if tip == sc && !c.arrowhead {
            return;
        }
        hline(grid, sr, sc, tip);
    } else {
        // L-shaped routing: horizontal → corner → vertical → corner → horizontal
        let mid = sc.min(tip) + sc.abs_diff(tip) / 2;
        let down = er > sr;

        if mid != sc {
            hline(grid, sr, sc, if mid > sc { mid - 1 } else { mid + 1 });
        }
        let inner = |a: usize, b: usize| (a.min(b) + 1, a.max(b) - 1);
        let (top, bottom) = inner(sr, er);
        if top <= bottom {
            vline(grid, mid, top, bottom);
        }
        if mid != tip {
            hline(grid, er, if tip > mid { mid + 1 } else { mid - 1 }, tip);
        }

        let from_side = if sc < mid { DIR_L } else if sc > mid { DIR_R } else { 0 };
        let to_side = if tip > mid { DIR_R } else if tip < mid { DIR_L } else { 0 };
        let (leave, arrive) = if down { (DIR_D, DIR_U) } else { (DIR_U, DIR_D) };
        if let Some(ch) = connections_to_char(from_side | leave) {
            grid.set_merge(sr, mid, ch);
        }
        if let Some(ch) = connections_to_char(to_side | arrive) {
            grid.set_merge(er, mid, ch);
        }
    }

    if c.arrowhead {
        grid.set(er, tip, arrow);
    }
}

fn detail_lines(panel: &DetailPanel, max_width: Option<usize>) -> Vec<String> {
    let title_width = display_width(&panel.label) + 6;
    let width = match max_width {
        Some(w) => w.max(MIN_BOX_WIDTH),
        None => MIN_PANEL_WIDTH.max(title_width),
    };
    let body = wrap(&panel.description, width.saturating_sub(4));
    let mut grid = Grid::new(width, body.len() + 2);

    grid.set(0, 0, '┌');
    grid.set(0, 1, '─');
    let title = truncate(&panel.label, width.saturating_sub(6));
    grid.write_str(0, 3, &title);
    for col in (4 + display_width(&title))..(width - 1) {
        grid.set(0, col, '─');
    }
    grid.set(0, width - 1, '┐');

    for (i, line) in body.iter().enumerate() {
        grid.set(i + 1, 0, '│');
        grid.write_str(i + 1, 2, line);
        grid.set(i + 1, width - 1, '│');
    }

    let last = body.len() + 1;
    grid.set(last, 0, '└');
    for col in 1..(width - 1) {
        grid.set(last, col, '─');
    }
    grid.set(last, width - 1, '┘');

    grid.lines()
}
