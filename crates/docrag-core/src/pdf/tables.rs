//! Line-based table detection
//!
//! Drawn rulings are snapped and joined into edges, edge intersections become
//! vertices, the smallest edge-bounded rectangles between vertices become
//! cells, and cells that share corners form a table.

use super::layout::{extract_text, BBox, PageLayout, Ruling};
use crate::config::PdfConfig;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Edges shorter than this are ignored
const MIN_EDGE_LENGTH: f64 = 3.0;

/// A detected table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub bbox: BBox,
    /// Row-major cell text; `None` where the grid has no cell
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn to_markdown(&self) -> String {
        table_to_markdown(&self.rows)
    }
}

/// Render rows as a markdown table; the first row is the header
pub fn table_to_markdown(rows: &[Vec<Option<String>>]) -> String {
    let Some(header) = rows.first() else {
        return String::new();
    };

    let clean = |row: &Vec<Option<String>>| -> String {
        let cells: Vec<&str> = row
            .iter()
            .map(|c| c.as_deref().map(str::trim).unwrap_or(""))
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(clean(header));
    lines.push(format!("| {} |", vec!["---"; header.len()].join(" | ")));
    for row in &rows[1..] {
        lines.push(clean(row));
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    /// Fixed coordinate: y for horizontal, x for vertical
    pos: f64,
    start: f64,
    end: f64,
}

impl Edge {
    fn length(&self) -> f64 {
        self.end - self.start
    }
}

type Point = (u64, u64);

fn key(x: f64, y: f64) -> Point {
    (x.to_bits(), y.to_bits())
}

/// Find every table drawn with rulings on the page, top to bottom
pub fn find_tables(page: &PageLayout, config: &PdfConfig) -> Vec<Table> {
    let tolerance = config.snap_tolerance;
    let (horizontal, vertical) = build_edges(&page.rulings, tolerance);
    if horizontal.is_empty() || vertical.is_empty() {
        return Vec::new();
    }

    let vertices = intersections(&horizontal, &vertical, tolerance);
    let cells = cells_from_vertices(&vertices);
    let mut tables: Vec<Table> = group_cells(&cells)
        .into_iter()
        .map(|group| build_table(page, &group, config))
        .collect();

    tables.sort_by(|a, b| a.bbox.top.total_cmp(&b.bbox.top));
    tables
}

/// Split rulings into snapped, joined and length-filtered edges
fn build_edges(rulings: &[Ruling], tolerance: f64) -> (Vec<Edge>, Vec<Edge>) {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();

    for r in rulings {
        if r.is_horizontal() {
            horizontal.push(Edge {
                pos: (r.top + r.bottom) / 2.0,
                start: r.x0,
                end: r.x1,
            });
        } else {
            vertical.push(Edge {
                pos: (r.x0 + r.x1) / 2.0,
                start: r.top,
                end: r.bottom,
            });
        }
    }

    let finish = |edges: Vec<Edge>| -> Vec<Edge> {
        join_edges(snap_edges(edges, tolerance), tolerance)
            .into_iter()
            .filter(|e| e.length() >= MIN_EDGE_LENGTH)
            .collect()
    };

    (finish(horizontal), finish(vertical))
}

/// Move edges whose fixed coordinate lies within `tolerance` of each other
/// onto their cluster's mean
fn snap_edges(mut edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    edges.sort_by(|a, b| a.pos.total_cmp(&b.pos));

    let mut clusters: Vec<Vec<Edge>> = Vec::new();
    for edge in edges {
        match clusters.last_mut() {
            Some(cluster) if edge.pos - cluster[cluster.len() - 1].pos <= tolerance => {
                cluster.push(edge)
            }
            _ => clusters.push(vec![edge]),
        }
    }

    clusters
        .into_iter()
        .flat_map(|cluster| {
            let mean = cluster.iter().map(|e| e.pos).sum::<f64>() / cluster.len() as f64;
            cluster.into_iter().map(move |e| Edge { pos: mean, ..e })
        })
        .collect()
}

/// Merge collinear edges that overlap or nearly touch
fn join_edges(edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    let mut by_pos: BTreeMap<u64, Vec<Edge>> = BTreeMap::new();
    for edge in edges {
        by_pos.entry(edge.pos.to_bits()).or_default().push(edge);
    }

    let mut joined = Vec::new();
    for (_, mut group) in by_pos {
        group.sort_by(|a, b| a.start.total_cmp(&b.start));
        let mut current = group[0];
        for edge in group.into_iter().skip(1) {
            if edge.start <= current.end + tolerance {
                current.end = current.end.max(edge.end);
            } else {
                joined.push(current);
                current = edge;
            }
        }
        joined.push(current);
    }
    joined
}

/// Vertex positions with the horizontal and vertical edges meeting there
struct Vertices {
    points: BTreeSet<(OrderedF64, OrderedF64)>,
    h_edges: HashMap<Point, Vec<usize>>,
    v_edges: HashMap<Point, Vec<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
struct OrderedF64(f64);

impl Eq for OrderedF64 {}

impl Ord for OrderedF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn intersections(horizontal: &[Edge], vertical: &[Edge], tolerance: f64) -> Vertices {
    let mut vertices = Vertices {
        points: BTreeSet::new(),
        h_edges: HashMap::new(),
        v_edges: HashMap::new(),
    };

    for (vi, v) in vertical.iter().enumerate() {
        for (hi, h) in horizontal.iter().enumerate() {
            let crosses = h.pos >= v.start - tolerance
                && h.pos <= v.end + tolerance
                && v.pos >= h.start - tolerance
                && v.pos <= h.end + tolerance;
            if crosses {
                let (x, y) = (v.pos, h.pos);
                vertices.points.insert((OrderedF64(x), OrderedF64(y)));
                vertices.h_edges.entry(key(x, y)).or_default().push(hi);
                vertices.v_edges.entry(key(x, y)).or_default().push(vi);
            }
        }
    }

    vertices
}

fn shares_edge(edges: &HashMap<Point, Vec<usize>>, a: Point, b: Point) -> bool {
    match (edges.get(&a), edges.get(&b)) {
        (Some(ea), Some(eb)) => ea.iter().any(|e| eb.contains(e)),
        _ => false,
    }
}

/// For each vertex, the nearest vertex below and to the right that closes an
/// edge-bounded rectangle
fn cells_from_vertices(vertices: &Vertices) -> Vec<BBox> {
    let points: Vec<(f64, f64)> = vertices.points.iter().map(|(x, y)| (x.0, y.0)).collect();
    let mut cells = Vec::new();

    for (i, &(x, y)) in points.iter().enumerate() {
        let here = key(x, y);
        let rest = &points[i + 1..];

        // Points are ordered by x then y, so "below" comes first in `rest`
        let below = rest.iter().filter(|&&(px, py)| px == x && py > y);
        let right: Vec<&(f64, f64)> = rest.iter().filter(|&&(px, py)| py == y && px > x).collect();

        'search: for &(bx, by) in below {
            if !shares_edge(&vertices.v_edges, here, key(bx, by)) {
                continue;
            }
            for &&(rx, ry) in &right {
                if !shares_edge(&vertices.h_edges, here, key(rx, ry)) {
                    continue;
                }
                let corner = key(rx, by);
                if vertices.points.contains(&(OrderedF64(rx), OrderedF64(by)))
                    && shares_edge(&vertices.h_edges, corner, key(bx, by))
                    && shares_edge(&vertices.v_edges, corner, key(rx, ry))
                {
                    cells.push(BBox::new(x, y, rx, by));
                    break 'search;
                }
            }
        }
    }

    cells
}

/// Union cells that share at least one corner
fn group_cells(cells: &[BBox]) -> Vec<Vec<BBox>> {
    let mut parent: Vec<usize> = (0..cells.len()).collect();

    fn find(parent: &mut Vec<usize>, i: usize) -> usize {
        let mut root = i;
        while parent[root] != root {
            root = parent[root];
        }
        let mut node = i;
        while parent[node] != root {
            let next = parent[node];
            parent[node] = root;
            node = next;
        }
        root
    }

    let mut owner: HashMap<Point, usize> = HashMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let corners = [
            key(cell.x0, cell.top),
            key(cell.x1, cell.top),
            key(cell.x0, cell.bottom),
            key(cell.x1, cell.bottom),
        ];
        for corner in corners {
            match owner.get(&corner) {
                Some(&j) => {
                    let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                    if a != b {
                        parent[a] = b;
                    }
                }
                None => {
                    owner.insert(corner, i);
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<BBox>> = BTreeMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(*cell);
    }
    groups.into_values().collect()
}

fn build_table(page: &PageLayout, cells: &[BBox], config: &PdfConfig) -> Table {
    let bbox = cells
        .iter()
        .skip(1)
        .fold(cells[0], |acc, cell| acc.union(cell));

    let tops: BTreeSet<OrderedF64> = cells.iter().map(|c| OrderedF64(c.top)).collect();
    let lefts: BTreeSet<OrderedF64> = cells.iter().map(|c| OrderedF64(c.x0)).collect();

    let rows = tops
        .iter()
        .map(|top| {
            lefts
                .iter()
                .map(|left| {
                    cells
                        .iter()
                        .find(|c| c.top == top.0 && c.x0 == left.0)
                        .map(|cell| cell_text(page, cell, config))
                })
                .collect()
        })
        .collect();

    Table { bbox, rows }
}

/// Cell text in reading order, lines joined with spaces
fn cell_text(page: &PageLayout, cell: &BBox, config: &PdfConfig) -> String {
    let words = page.words_in(cell);
    extract_text(&words, config.x_tolerance, config.y_tolerance)
        .lines()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::layout::Word;

    /// Ruled grid with the given column x positions and row y positions
    fn grid(xs: &[f64], ys: &[f64]) -> Vec<Ruling> {
        let (x_min, x_max) = (xs[0], xs[xs.len() - 1]);
        let (y_min, y_max) = (ys[0], ys[ys.len() - 1]);
        let mut rulings: Vec<Ruling> = ys
            .iter()
            .map(|&y| Ruling::horizontal(x_min, x_max, y))
            .collect();
        rulings.extend(xs.iter().map(|&x| Ruling::vertical(x, y_min, y_max)));
        rulings
    }

    fn word(text: &str, x0: f64, top: f64) -> Word {
        Word::new(text, BBox::new(x0, top, x0 + 10.0, top + 8.0))
    }

    #[test]
    fn test_markdown_with_missing_cell() {
        let rows = vec![
            vec![Some("A".to_string()), Some("B".to_string())],
            vec![Some("1".to_string()), None],
        ];
        assert_eq!(
            table_to_markdown(&rows),
            "| A | B |\n| --- | --- |\n| 1 |  |"
        );
    }

    #[test]
    fn test_markdown_trims_cells_and_handles_empty() {
        let rows = vec![vec![Some("  x ".to_string())]];
        assert_eq!(table_to_markdown(&rows), "| x |\n| --- |");
        assert_eq!(table_to_markdown(&[]), "");
    }

    #[test]
    fn test_detects_simple_grid() {
        let page = PageLayout::new(1, 600.0, 800.0)
            .with_rulings(grid(&[100.0, 200.0, 300.0], &[100.0, 120.0, 140.0]))
            .with_words(vec![
                word("A", 110.0, 105.0),
                word("B", 210.0, 105.0),
                word("1", 110.0, 125.0),
                word("2", 210.0, 125.0),
            ]);

        let tables = find_tables(&page, &PdfConfig::default());
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert_eq!(table.bbox, BBox::new(100.0, 100.0, 300.0, 140.0));
        assert_eq!(
            table.rows,
            vec![
                vec![Some("A".to_string()), Some("B".to_string())],
                vec![Some("1".to_string()), Some("2".to_string())],
            ]
        );
    }

    #[test]
    fn test_snaps_slightly_misaligned_rulings() {
        let mut rulings = grid(&[100.0, 200.0, 300.0], &[100.0, 120.0, 140.0]);
        // Same row line drawn twice, 1pt apart and split in two segments
        rulings.push(Ruling::horizontal(100.0, 180.0, 121.0));
        rulings.push(Ruling::horizontal(178.0, 300.0, 121.0));
        let page = PageLayout::new(1, 600.0, 800.0).with_rulings(rulings);

        let tables = find_tables(&page, &PdfConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].row_count(), 2);
    }

    #[test]
    fn test_separate_grids_are_separate_tables() {
        let mut rulings = grid(&[50.0, 150.0, 250.0], &[500.0, 520.0, 540.0]);
        rulings.extend(grid(&[50.0, 150.0, 250.0], &[100.0, 120.0, 140.0]));
        let page = PageLayout::new(1, 600.0, 800.0).with_rulings(rulings);

        let tables = find_tables(&page, &PdfConfig::default());
        assert_eq!(tables.len(), 2);
        assert!(tables[0].bbox.top < tables[1].bbox.top);
    }

    #[test]
    fn test_merged_cell_leaves_gap() {
        // Header spans both columns: no divider in the top row
        let rulings = vec![
            Ruling::horizontal(100.0, 300.0, 100.0),
            Ruling::horizontal(100.0, 300.0, 120.0),
            Ruling::horizontal(100.0, 300.0, 140.0),
            Ruling::vertical(100.0, 100.0, 140.0),
            Ruling::vertical(300.0, 100.0, 140.0),
            Ruling::vertical(200.0, 120.0, 140.0),
        ];
        let page = PageLayout::new(1, 600.0, 800.0)
            .with_rulings(rulings)
            .with_words(vec![word("Title", 150.0, 105.0)]);

        let tables = find_tables(&page, &PdfConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].rows,
            vec![
                vec![Some("Title".to_string()), None],
                vec![Some(String::new()), Some(String::new())],
            ]
        );
    }

    #[test]
    fn test_no_rulings_no_tables() {
        let page = PageLayout::new(1, 600.0, 800.0).with_words(vec![word("text", 10.0, 10.0)]);
        assert!(find_tables(&page, &PdfConfig::default()).is_empty());
    }

    #[test]
    fn test_single_box_is_one_cell_table() {
        let page = PageLayout::new(1, 600.0, 800.0)
            .with_rulings(grid(&[100.0, 300.0], &[100.0, 200.0]))
            .with_words(vec![word("Note", 110.0, 105.0)]);

        let tables = find_tables(&page, &PdfConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].bbox, BBox::new(100.0, 100.0, 300.0, 200.0));
        assert_eq!(tables[0].rows, vec![vec![Some("Note".to_string())]]);
    }
}
