//! Table layout.
//!
//! [§ 17 Tables](https://www.w3.org/TR/CSS2/tables.html)
//!
//! [§ 17.5.2.2 Automatic table layout](https://www.w3.org/TR/CSS2/tables.html#auto-table-layout)
//!
//! "In this algorithm (which generally requires no more than two passes),
//! the table's width is given by the width of its columns (and intervening
//! borders)."
//!
//! [`layout_table`] builds a grid from the table's rows, resolves one width
//! per column from declared widths and content min/max widths, then lays
//! out cells row by row. The column arithmetic lives in free functions so
//! it can be exercised without a tree.

use crate::error::{LayoutError, TableError};
use crate::geometry::{Point, Rect, Size};
use crate::length::CssLength;
use crate::measure::{self, UNBOUNDED};
use crate::style::{DisplayKind, PageBreakInside, Sides, TextAlign, VerticalAlign};
use crate::tree::{BoxId, BoxTree};

use super::{LayoutContext, layout_box, measure_box};

/// Scan at most this many columns for declared cell widths, plus any
/// column that is still unresolved.
const WIDTH_SCAN_LIMIT: usize = 20;

/// Iteration cap of the `max-width` reconciliation loops.
const MAX_WIDTH_ITERATIONS: usize = 15;

/// Content-driven bounds of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnBounds {
    /// Widest unbreakable content.
    pub min: f32,
    /// Content laid out without wrapping.
    pub max: f32,
}

/// One slot of a grid row: a cell or a spacing placeholder.
#[derive(Debug, Clone, Copy)]
struct GridCell {
    id: BoxId,
    column: usize,
    colspan: usize,
    rowspan: usize,
    /// For placeholders: the spanning cell and the last row it covers.
    placeholder: Option<(BoxId, usize)>,
}

/// Rows of a table in layout order with real column indices.
#[derive(Debug, Default)]
struct Grid {
    caption: Option<BoxId>,
    rows: Vec<BoxId>,
    cells: Vec<Vec<GridCell>>,
    columns: Vec<BoxId>,
}

impl Grid {
    fn column_count(&self) -> usize {
        if self.columns.is_empty() {
            self.cells
                .iter()
                .map(|row| row.last().map_or(0, |c| c.column + c.colspan))
                .max()
                .unwrap_or(0)
        } else {
            self.columns.len()
        }
    }

    fn real_cells(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.iter().flatten().filter(|c| c.placeholder.is_none())
    }
}

fn span_attribute(tree: &BoxTree, id: BoxId, name: &str) -> usize {
    tree[id].tag.as_ref().map_or(1, |t| t.span(name))
}

/// Rows of a row group, in order.
fn group_rows(tree: &BoxTree, group: BoxId) -> impl Iterator<Item = BoxId> + '_ {
    tree.children(group)
        .iter()
        .copied()
        .filter(|&r| tree[r].style.display == DisplayKind::TableRow)
}

/// [§ 17.2 The CSS table model](https://www.w3.org/TR/CSS2/tables.html#table-display)
///
/// Classify the children of `table`: caption, header, body and footer rows,
/// and explicit columns (with `span` expanded). Only the first header and
/// footer group keep their role; later ones are body rows. The result lists
/// rows as header, body, footer.
fn classify(tree: &BoxTree, table: BoxId) -> Grid {
    let mut grid = Grid::default();
    let mut header = None;
    let mut footer = None;
    let mut body = Vec::new();

    for &child in tree.children(table) {
        match tree[child].style.display {
            DisplayKind::TableCaption => grid.caption = grid.caption.or(Some(child)),
            DisplayKind::TableRow => body.push(child),
            DisplayKind::TableRowGroup => body.extend(group_rows(tree, child)),
            DisplayKind::TableHeaderGroup if header.is_none() => header = Some(child),
            DisplayKind::TableFooterGroup if footer.is_none() => footer = Some(child),
            DisplayKind::TableHeaderGroup | DisplayKind::TableFooterGroup => {
                body.extend(group_rows(tree, child));
            }
            DisplayKind::TableColumn => {
                grid.columns
                    .extend(std::iter::repeat_n(child, span_attribute(tree, child, "span")));
            }
            DisplayKind::TableColumnGroup => {
                let columns = tree.children(child);
                if columns.is_empty() {
                    grid.columns
                        .extend(std::iter::repeat_n(child, span_attribute(tree, child, "span")));
                } else {
                    for &col in columns {
                        grid.columns
                            .extend(std::iter::repeat_n(col, span_attribute(tree, col, "span")));
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(header) = header {
        grid.rows.extend(group_rows(tree, header));
    }
    grid.rows.extend(body);
    if let Some(footer) = footer {
        grid.rows.extend(group_rows(tree, footer));
    }
    grid
}

/// Fill in the per-row slots of `grid`, placeholders included.
fn index_cells(tree: &BoxTree, grid: &mut Grid) {
    grid.cells = grid
        .rows
        .iter()
        .map(|&row| {
            let mut column = 0;
            tree.children(row)
                .iter()
                .filter_map(|&id| {
                    let node = &tree[id];
                    let placeholder = match node.kind {
                        crate::tree::BoxKind::SpacingPlaceholder { extends, end_row } => {
                            Some((extends, end_row))
                        }
                        _ if node.style.display == DisplayKind::TableCell => None,
                        _ => return None,
                    };
                    let span_source = placeholder.map_or(id, |(extends, _)| extends);
                    let colspan = span_attribute(tree, span_source, "colspan");
                    let rowspan = if placeholder.is_some() {
                        1
                    } else {
                        span_attribute(tree, id, "rowspan")
                    };
                    let cell = GridCell {
                        id,
                        column,
                        colspan,
                        rowspan,
                        placeholder,
                    };
                    column += colspan;
                    Some(cell)
                })
                .collect()
        })
        .collect();
}

/// Last row a cell starting at `row` covers; spans are clipped to the
/// table's rows.
fn last_spanned_row(row: usize, rowspan: usize, row_count: usize) -> usize {
    (row + rowspan - 1).min(row_count.saturating_sub(1))
}

/// [§ 17.5 Visual layout of table contents](https://www.w3.org/TR/CSS2/tables.html#table-layout)
///
/// Insert one spacing placeholder per row covered by a `rowspan` cell, at
/// the spanned column, so every row accounts for the columns taken from
/// above. Runs once per table.
fn insert_placeholders(tree: &mut BoxTree, table: BoxId, grid: &mut Grid) -> Result<(), LayoutError> {
    if tree[table].placeholders_inserted {
        index_cells(tree, grid);
        return Ok(());
    }
    for current in 0..grid.rows.len() {
        index_cells(tree, grid);
        let spanning: Vec<GridCell> = grid.cells[current]
            .iter()
            .filter(|c| c.placeholder.is_none() && c.rowspan > 1)
            .copied()
            .collect();
        for cell in spanning {
            let end_row = last_spanned_row(current, cell.rowspan, grid.rows.len());
            for target in current + 1..=end_row {
                index_cells(tree, grid);
                let before = grid.cells[target]
                    .iter()
                    .find(|c| c.column >= cell.column)
                    .map(|c| c.id);
                let _ = tree.create_placeholder(grid.rows[target], before, cell.id, end_row)?;
            }
        }
    }
    tree[table].placeholders_inserted = true;
    index_cells(tree, grid);
    Ok(())
}

/// Fill unresolved (NaN) columns of a table with a specified width.
///
/// Columns whose even share of the remaining space exceeds their content
/// maximum take that maximum; this repeats until stable since each such
/// column changes the share of the rest. Columns still unresolved split
/// what is left evenly. Any slack then goes to the originally unresolved
/// columns, or proportionally to all columns when every width was declared.
pub fn resolve_specified_widths(widths: &mut [f32], bounds: &[ColumnBounds], available: f32) {
    let originally_unresolved: Vec<bool> = widths.iter().map(|w| w.is_nan()).collect();
    let mut unresolved = originally_unresolved.iter().filter(|&&n| n).count();
    let mut occupied: f32 = widths.iter().filter(|w| !w.is_nan()).sum();
    let original_unresolved = unresolved;

    if unresolved > 0 {
        loop {
            let before = unresolved;
            for (i, width) in widths.iter_mut().enumerate() {
                if unresolved == 0 {
                    break;
                }
                let share = (available - occupied) / unresolved as f32;
                if width.is_nan() && share > bounds[i].max {
                    *width = bounds[i].max;
                    unresolved -= 1;
                    occupied += bounds[i].max;
                }
            }
            if before == unresolved {
                break;
            }
        }
        if unresolved > 0 {
            let share = (available - occupied) / unresolved as f32;
            for width in widths.iter_mut().filter(|w| w.is_nan()) {
                *width = share;
            }
            occupied = available;
        }
    }

    if occupied < available {
        let slack = available - occupied;
        if original_unresolved > 0 {
            let extra = slack / original_unresolved as f32;
            for (width, _) in widths
                .iter_mut()
                .zip(&originally_unresolved)
                .filter(|(_, n)| **n)
            {
                *width += extra;
            }
        } else if occupied > 0.0 {
            for width in widths.iter_mut() {
                *width += slack * (*width / occupied);
            }
        }
    }
}

/// Fill unresolved (NaN) columns of a table without a specified width:
/// start every such column at its content minimum, then grow columns left
/// to right toward their content maximum while space remains, giving each
/// an even share of what is left.
pub fn resolve_unspecified_widths(widths: &mut [f32], bounds: &[ColumnBounds], available: f32) {
    let mut occupied = 0.0;
    for (width, bound) in widths.iter_mut().zip(bounds) {
        if width.is_nan() {
            *width = bound.min;
        }
        occupied += *width;
    }
    let count = widths.len();
    for (i, width) in widths.iter_mut().enumerate() {
        if bounds[i].max > *width {
            let previous = *width;
            *width = (*width + (available - occupied) / (count - i) as f32).min(bounds[i].max);
            occupied += *width - previous;
        }
    }
}

/// Per-column minimum widths from cells given as `(column, colspan,
/// minimum)`. A spanning cell only adds to its last column what the
/// columns before it (and the spacing between them) do not already cover.
#[must_use]
pub fn column_minimums(cells: &[(usize, usize, f32)], count: usize, spacing: f32) -> Vec<f32> {
    let mut minimums = vec![0.0_f32; count];
    for &(column, colspan, minimum) in cells {
        if column >= count {
            continue;
        }
        let last = (column + colspan).min(count) - 1;
        let spanned: f32 = minimums[column..last].iter().sum::<f32>() + (colspan - 1) as f32 * spacing;
        minimums[last] = minimums[last].max(minimum - spanned);
    }
    minimums
}

/// Raise columns narrower than their minimum, taking the shortfall from the
/// next column. `cells` gives each cell as `(column, colspan)`.
///
/// The next column may go below its own minimum, or negative.
pub fn enforce_min_widths(widths: &mut [f32], minimums: &[f32], cells: &[(usize, usize)]) {
    let count = widths.len();
    for &(column, colspan) in cells {
        if column >= count || widths[column] >= minimums[column] {
            continue;
        }
        let shortfall = minimums[column] - widths[column];
        let last = (column + colspan - 1).min(count - 1);
        widths[last] = minimums[last];
        if column + 1 < count {
            widths[column + 1] -= shortfall;
        }
    }
}

/// Shrink columns one unit at a time, round robin, while `total(widths)`
/// exceeds `available` and some column is wider than its minimum.
pub fn reduce_to_available(
    widths: &mut [f32],
    minimums: &[f32],
    available: f32,
    overhead: f32,
) {
    let count = widths.len();
    let reducible = |widths: &[f32], i: usize| widths[i] > minimums[i];
    let mut column = 0;
    while widths.iter().sum::<f32>() + overhead > available
        && (0..count).any(|i| reducible(widths, i))
    {
        while !reducible(widths, column) {
            column = (column + 1) % count;
        }
        widths[column] -= (widths[column] - minimums[column]).min(1.0);
        column = (column + 1) % count;
    }
}

/// Fit the columns under an explicit `max-width`: drop every column to its
/// content minimum, then either shave the widest columns evenly if that is
/// still too wide, or grow columns below their content maximum if there
/// is room. Both loops stop after a fixed number of rounds.
///
/// Each shaving round lowers every column of the widest width (within 0.1)
/// to the next distinct width, or by an even share of the excess when all
/// columns are equal, and never by more than the excess.
pub fn fit_max_width(widths: &mut [f32], bounds: &[ColumnBounds], max_width: f32, overhead: f32) {
    if widths.is_empty() {
        return;
    }
    let total = |widths: &[f32]| widths.iter().sum::<f32>() + overhead;
    if total(widths) <= max_width {
        return;
    }
    for (width, bound) in widths.iter_mut().zip(bounds) {
        *width = bound.min;
    }
    let count = widths.len() as f32;

    let mut sum = total(widths);
    if max_width < sum {
        for _ in 0..MAX_WIDTH_ITERATIONS {
            if max_width >= sum - 0.1 {
                break;
            }
            let widest = widths.iter().copied().fold(0.0_f32, f32::max);
            let widest_count = widths.iter().filter(|&&w| w > widest - 0.1).count();
            let second = widths
                .iter()
                .copied()
                .filter(|&w| w <= widest - 0.1)
                .fold(0.0_f32, f32::max);
            let excess = sum - max_width;
            let mut decrease = if second > 0.0 {
                widest - second
            } else {
                excess / count
            };
            if decrease * widest_count as f32 > excess {
                decrease = excess / widest_count as f32;
            }
            for w in widths.iter_mut().filter(|w| **w > widest - 0.1) {
                *w -= decrease;
            }
            sum = total(widths);
        }
    } else {
        for _ in 0..MAX_WIDTH_ITERATIONS {
            if max_width <= sum + 0.1 {
                break;
            }
            let mut growable = widths
                .iter()
                .zip(bounds)
                .filter(|(w, b)| **w + 1.0 < b.max)
                .count();
            if growable == 0 {
                growable = widths.len();
            }
            let mut increment = (max_width - sum) / growable as f32;
            let mut hit = false;
            for (w, b) in widths.iter().zip(bounds) {
                if *w + 0.1 < b.max {
                    increment = increment.min(b.max - *w);
                    hit = true;
                }
            }
            for (w, b) in widths.iter_mut().zip(bounds) {
                if !hit || *w + 1.0 < b.max {
                    *w += increment;
                }
            }
            sum = total(widths);
        }
    }
}

/// Content bounds of each column, from cells in `grid` whose column is
/// unresolved (or every cell when `only_unresolved` is false). A spanning
/// cell's bounds are split evenly across its columns.
fn content_bounds(
    tree: &BoxTree,
    grid: &Grid,
    widths: &[f32],
    only_unresolved: bool,
    cx: &LayoutContext<'_>,
) -> Result<Vec<ColumnBounds>, LayoutError> {
    let count = widths.len();
    let mut bounds = vec![ColumnBounds::default(); count];
    if count == 0 {
        return Ok(bounds);
    }
    for cell in grid.cells.iter().flatten() {
        let column = cell.column.min(count - 1);
        if only_unresolved && !widths[column].is_nan() {
            continue;
        }
        let (min, max) = measure::min_max_width(tree, cell.id, cx.fonts, cx.text)?;
        let span = cell.colspan as f32;
        for bound in bounds.iter_mut().skip(column).take(cell.colspan) {
            bound.min = bound.min.max(min / span);
            bound.max = bound.max.max(max / span);
        }
    }
    Ok(bounds)
}

/// Declared column widths: from `<col>` boxes when present, otherwise from
/// cell `width`s. Unresolved columns are NaN.
fn declared_widths(
    tree: &BoxTree,
    grid: &Grid,
    count: usize,
    available: f32,
    cx: &LayoutContext<'_>,
) -> Vec<f32> {
    let mut widths = vec![f32::NAN; count];
    if !grid.columns.is_empty() {
        for (width, &col) in widths.iter_mut().zip(&grid.columns) {
            if let Some(w) = measure::resolve(tree, col, cx.fonts, &tree[col].style.width, available)
                .filter(|&w| w > 0.0)
            {
                *width = w;
            }
        }
        return widths;
    }

    for cell in grid.real_cells() {
        if cell.column >= count || (cell.column >= WIDTH_SCAN_LIMIT && !widths[cell.column].is_nan()) {
            continue;
        }
        let Some(width) = measure::resolve(tree, cell.id, cx.fonts, &tree[cell.id].style.width, available)
            .filter(|&w| w > 0.0)
        else {
            continue;
        };
        let share = width / cell.colspan as f32;
        for w in widths.iter_mut().skip(cell.column).take(cell.colspan) {
            *w = if w.is_nan() { share } else { w.max(share) };
        }
    }
    widths
}

/// Sum of `widths` plus spacing and table borders.
fn width_sum(table: BoxId, widths: &[f32], overhead: f32) -> Result<f32, TableError> {
    if let Some(column) = widths.iter().position(|w| w.is_nan()) {
        return Err(TableError::UnresolvedColumn { table, column });
    }
    Ok(widths.iter().sum::<f32>() + overhead)
}

/// Move `id` and everything painted for its subtree down by `dy`.
fn offset_top(tree: &mut BoxTree, id: BoxId, dy: f32) {
    let node = &mut tree[id];
    node.location.y += dy;
    for rect in &mut node.rectangles {
        *rect = rect.offset(0.0, dy);
    }
    for word in &mut node.words {
        word.top += dy;
    }
    for line in &mut node.line_boxes {
        for (_, rect) in &mut line.rectangles {
            *rect = rect.offset(0.0, dy);
        }
    }
    let marker = node.list_marker;
    for child in tree.children(id).to_vec() {
        offset_top(tree, child, dy);
    }
    if let Some(marker) = marker {
        offset_top(tree, marker, dy);
    }
}

/// Lowest painted edge in the subtree of `id`, below `floor`.
fn content_bottom(tree: &BoxTree, id: BoxId, floor: f32) -> f32 {
    let node = &tree[id];
    if node.style.display == DisplayKind::None {
        return floor;
    }
    let mut bottom = node
        .rectangles
        .iter()
        .map(Rect::bottom)
        .chain(node.words.iter().map(crate::tree::Word::bottom))
        .fold(floor, f32::max);
    for &child in node.children() {
        if tree[child].style.display.is_block_level() {
            bottom = bottom.max(tree[child].actual_bottom());
        }
        bottom = content_bottom(tree, child, bottom);
    }
    bottom
}

/// [§ 17.5.4 Horizontal alignment in a column](https://www.w3.org/TR/CSS2/tables.html#column-alignment)
///
/// Shift the content of `cell` for `vertical-align: middle` or `bottom`.
fn apply_cell_vertical_alignment(tree: &mut BoxTree, cell: BoxId, cx: &LayoutContext<'_>) {
    let align = tree[cell].style.vertical_align;
    if !matches!(align, VerticalAlign::Middle | VerticalAlign::Bottom) {
        return;
    }
    let client_bottom = measure::client_rect(tree, cell, cx.fonts).bottom();
    let top = measure::client_rect(tree, cell, cx.fonts).top();
    let bottom = tree
        .children(cell)
        .iter()
        .fold(top, |acc, &child| content_bottom(tree, child, acc));
    let mut dy = client_bottom - bottom;
    if align == VerticalAlign::Middle {
        dy /= 2.0;
    }
    if dy.abs() < f32::EPSILON {
        return;
    }
    for child in tree.children(cell).to_vec() {
        offset_top(tree, child, dy);
    }
}

/// Move a cell that straddles a page boundary to the top of the next page.
/// Returns whether it moved.
fn break_page(tree: &mut BoxTree, id: BoxId, cx: &LayoutContext<'_>) -> bool {
    let page = cx.settings.page_size.height;
    let margin = cx.settings.margins.top;
    let node = &tree[id];
    if page < 1.0 || node.size.height >= page {
        return false;
    }
    let rem_top = (node.location.y - margin).rem_euclid(page);
    let rem_bottom = (node.actual_bottom() - margin).rem_euclid(page);
    if rem_top > rem_bottom {
        let node = &mut tree[id];
        node.location.y += page - rem_top + 1.0;
        true
    } else {
        false
    }
}

/// Lay out table `table` and its cells.
pub(crate) fn layout_table(
    tree: &mut BoxTree,
    table: BoxId,
    cx: &mut LayoutContext<'_>,
) -> Result<(), LayoutError> {
    // STEP 1: measure every fragment.
    for id in tree.descendants(table) {
        if id != table && tree[id].style.display != DisplayKind::None {
            measure_box(tree, id, cx)?;
        }
    }

    // STEP 2: classify children.
    let mut grid = classify(tree, table);

    // STEP 3: rowspan placeholders.
    insert_placeholders(tree, table, &mut grid)?;

    // STEP 4: column count and declared widths.
    let (h_spacing, v_spacing) = measure::table_spacing(tree, table, cx.fonts);
    let edges = measure::edges(tree, table, cx.fonts);
    let count = grid.column_count();
    let overhead = h_spacing * (count + 1) as f32 + edges.border.horizontal();

    let parent_available = match tree.containing_block(table)? {
        cb if cb == table => tree[table].size.width,
        cb => tree[cb].size.width - measure::edges(tree, cb, cx.fonts).inner_horizontal(),
    };
    let specified = measure::resolve(tree, table, cx.fonts, &tree[table].style.width, parent_available)
        .filter(|&w| w > 0.0);
    let max_width = measure::resolve(tree, table, cx.fonts, &tree[table].style.max_width, parent_available)
        .filter(|&w| w > 0.0);
    let available_table = specified.unwrap_or(parent_available);
    let available_cells = available_table - overhead;

    let mut widths = declared_widths(tree, &grid, count, available_cells, cx);

    // STEP 5: resolve the rest.
    let bounds = content_bounds(tree, &grid, &widths, true, cx)?;
    if specified.is_some() {
        resolve_specified_widths(&mut widths, &bounds, available_cells);
    } else {
        resolve_unspecified_widths(&mut widths, &bounds, available_cells);
    }

    // STEP 6: minimum widths.
    let mut cell_minimums = Vec::new();
    for cell in grid.real_cells() {
        let minimum = measure::minimum_width(tree, cell.id, cx.fonts, cx.text)?
            + measure::edges(tree, cell.id, cx.fonts).inner_horizontal();
        cell_minimums.push((cell.column, cell.colspan, minimum));
    }
    let minimums = column_minimums(&cell_minimums, count, h_spacing);
    let spans: Vec<(usize, usize)> = cell_minimums.iter().map(|&(c, s, _)| (c, s)).collect();
    enforce_min_widths(&mut widths, &minimums, &spans);

    // STEP 7: maximum widths.
    let _ = width_sum(table, &widths, overhead)?;
    reduce_to_available(&mut widths, &minimums, available_table, overhead);
    if let Some(max_width) = max_width.filter(|&m| m < UNBOUNDED) {
        let all_bounds = content_bounds(tree, &grid, &widths, false, cx)?;
        fit_max_width(&mut widths, &all_bounds, max_width, overhead);
    }
    let total = width_sum(table, &widths, overhead)?;

    tracing::trace!(table = %table, columns = ?widths, total, "resolved column widths");

    // STEP 8: spacing replaces table padding.
    tree[table].style.padding = Sides::all(CssLength::zero());

    // STEP 9: caption and cells.
    let client = measure::client_rect(tree, table, cx.fonts);
    let mut start_x = (client.left() + h_spacing).max(0.0);
    let mut start_y = (client.top() + v_spacing).max(0.0);

    match tree[table].style.text_align {
        TextAlign::Right => {
            let shift = available_table - total;
            start_x += shift;
            tree[table].location.x += shift;
        }
        TextAlign::Center => {
            let shift = (available_table - total) / 2.0;
            start_x += shift;
            tree[table].location.x += shift;
        }
        TextAlign::Left | TextAlign::Justify => {}
    }

    if let Some(caption) = grid.caption {
        let location = tree[table].location;
        let node = &mut tree[caption];
        node.location = location;
        node.size = Size::new(total, 0.0);
        let _ = layout_box(tree, caption, cx)?;
        start_y = start_y.max(tree[caption].actual_bottom() + v_spacing);
    }

    let mut cur_y = start_y;
    let mut max_right = start_x;
    let mut max_bottom = 0.0_f32;
    let mut retries = 0;
    let retry_limit = grid.rows.len() * 2;
    let mut row_index = 0;
    let mut current_row = 0;

    while row_index < grid.rows.len() {
        let row = grid.rows[row_index];
        let cells = grid.cells[row_index].clone();
        let mut cur_x = start_x;
        let row_top = cur_y;

        for cell in cells.iter().take_while(|c| c.column < count) {
            let width: f32 = widths.iter().skip(cell.column).take(cell.colspan).sum::<f32>()
                + (cell.colspan - 1) as f32 * h_spacing;
            let node = &mut tree[cell.id];
            node.location = Point::new(cur_x, cur_y);
            node.size = Size::new(width, 0.0);

            match cell.placeholder {
                Some((extends, end_row)) if end_row == current_row => {
                    max_bottom = max_bottom.max(tree[extends].actual_bottom());
                }
                Some(_) => {}
                None => {
                    let _ = layout_box(tree, cell.id, cx)?;
                    if last_spanned_row(current_row, cell.rowspan, grid.rows.len()) == current_row {
                        max_bottom = max_bottom.max(tree[cell.id].actual_bottom());
                    }
                    max_right = max_right.max(tree[cell.id].actual_right());
                }
            }
            cur_x = tree[cell.id].location.x + width + h_spacing;
        }

        let mut moved = false;
        for cell in &cells {
            match cell.placeholder {
                None if last_spanned_row(current_row, cell.rowspan, grid.rows.len()) == current_row => {
                    tree[cell.id].set_actual_bottom(max_bottom);
                    apply_cell_vertical_alignment(tree, cell.id, cx);
                }
                Some((extends, end_row)) if end_row == current_row => {
                    tree[extends].set_actual_bottom(max_bottom);
                    apply_cell_vertical_alignment(tree, extends, cx);
                }
                _ => {}
            }

            if cell.placeholder.is_none()
                && tree[table].style.page_break_inside != PageBreakInside::Avoid
                && retries < retry_limit
                && break_page(tree, cell.id, cx)
            {
                cur_y = tree[cell.id].location.y;
                moved = true;
                break;
            }
        }

        if moved {
            // Move the whole row to the next page; a second row takes the
            // first one with it.
            retries += 1;
            if row_index == 1 {
                row_index = 0;
                current_row = 0;
            }
            max_bottom = 0.0;
            continue;
        }

        let row_right = cur_x - h_spacing;
        let node = &mut tree[row];
        node.location = Point::new(start_x, row_top);
        node.size = Size::new((row_right - start_x).max(0.0), (max_bottom - row_top).max(0.0));

        cur_y = max_bottom + v_spacing;
        row_index += 1;
        current_row += 1;
    }

    size_row_groups(tree, table);

    // STEP 10: table extent.
    let right = max_right + h_spacing + edges.border.right;
    let bottom = max_bottom.max(start_y) + v_spacing + edges.border.bottom;
    let node = &mut tree[table];
    node.set_actual_right(right);
    node.set_actual_bottom(bottom);

    #[cfg(feature = "layout-trace")]
    tracing::trace!(
        table = %table,
        rows = grid.rows.len(),
        columns = count,
        right,
        bottom,
        "table laid out"
    );
    Ok(())
}

/// Give row groups the union of their rows' bounds.
fn size_row_groups(tree: &mut BoxTree, table: BoxId) {
    for group in tree.children(table).to_vec() {
        let display = tree[group].style.display;
        if !matches!(
            display,
            DisplayKind::TableRowGroup | DisplayKind::TableHeaderGroup | DisplayKind::TableFooterGroup
        ) {
            continue;
        }
        let bounds = group_rows(tree, group)
            .map(|r| tree[r].bounds())
            .filter(|r| !r.is_empty())
            .reduce(|a, b| a.union(&b));
        if let Some(bounds) = bounds {
            let node = &mut tree[group];
            node.location = bounds.location();
            node.size = bounds.size();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(pairs: &[(f32, f32)]) -> Vec<ColumnBounds> {
        pairs
            .iter()
            .map(|&(min, max)| ColumnBounds { min, max })
            .collect()
    }

    #[test]
    fn unspecified_widths_grow_evenly() {
        let mut widths = vec![f32::NAN; 3];
        resolve_unspecified_widths(&mut widths, &bounds(&[(50.0, 100.0); 3]), 300.0);
        assert_eq!(widths, vec![100.0, 100.0, 100.0]);
    }

    #[test]
    fn unspecified_widths_stop_at_available() {
        let mut widths = vec![f32::NAN; 2];
        resolve_unspecified_widths(&mut widths, &bounds(&[(10.0, 200.0); 2]), 100.0);
        assert_eq!(widths, vec![50.0, 50.0]);
    }

    #[test]
    fn specified_widths_cap_narrow_columns() {
        let mut widths = vec![f32::NAN, f32::NAN];
        resolve_specified_widths(&mut widths, &bounds(&[(10.0, 20.0), (10.0, 500.0)]), 200.0);
        assert_eq!(widths[0], 20.0);
        assert_eq!(widths[1], 180.0);
    }

    #[test]
    fn specified_widths_spread_slack_proportionally() {
        let mut widths = vec![50.0, 150.0];
        resolve_specified_widths(&mut widths, &bounds(&[(0.0, 0.0); 2]), 400.0);
        assert_eq!(widths, vec![100.0, 300.0]);
    }

    #[test]
    fn minimum_steals_from_next_column() {
        let mut widths = vec![100.0, 100.0, 100.0];
        enforce_min_widths(&mut widths, &[150.0, 0.0, 0.0], &[(0, 1), (1, 1), (2, 1)]);
        assert_eq!(widths, vec![150.0, 50.0, 100.0]);
    }

    #[test]
    fn spanning_minimum_lands_on_last_column() {
        let minimums = column_minimums(&[(0, 1, 40.0), (0, 2, 100.0)], 2, 2.0);
        assert_eq!(minimums, vec![40.0, 58.0]);
    }

    #[test]
    fn reduction_respects_minimums() {
        let mut widths = vec![100.0, 100.0];
        reduce_to_available(&mut widths, &[90.0, 20.0], 150.0, 0.0);
        assert_eq!(widths[0], 90.0);
        assert_eq!(widths[1], 60.0);
    }

    #[test]
    fn max_width_shaves_widest() {
        let mut widths = vec![300.0, 100.0];
        fit_max_width(&mut widths, &bounds(&[(200.0, 300.0), (100.0, 100.0)]), 250.0, 0.0);
        let total: f32 = widths.iter().sum();
        assert!((total - 250.0).abs() < 0.5, "total {total}");
        assert!(widths[0] < 200.0);
    }
}
