use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone, Copy)]
pub struct UiAreas {
    pub size: Rect,
    pub header: Rect,
    pub networks: Rect,
    pub wallet: Rect,
    pub contracts: Rect,
    pub inspector: Rect,
    pub status_line: Rect,
    pub command_line: Rect,
}

pub fn areas(size: Rect) -> UiAreas {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(size);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(26),
            Constraint::Percentage(30),
            Constraint::Percentage(44),
        ])
        .split(vertical[1]);

    let sidebar_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(7), Constraint::Length(11)])
        .split(main_chunks[0]);

    let footer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(vertical[2]);

    UiAreas {
        size,
        header: vertical[0],
        networks: sidebar_chunks[0],
        wallet: sidebar_chunks[1],
        contracts: main_chunks[1],
        inspector: main_chunks[2],
        status_line: footer_chunks[0],
        command_line: footer_chunks[1],
    }
}

/// Whether a terminal cell falls inside `rect`
pub fn contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x
        && col < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panels_do_not_overlap() {
        let areas = areas(Rect::new(0, 0, 120, 40));
        assert_eq!(areas.header.height, 3);
        assert_eq!(areas.status_line.y + 1, areas.command_line.y);
        assert!(areas.networks.x < areas.contracts.x);
        assert!(areas.contracts.x < areas.inspector.x);
        assert_eq!(areas.networks.y + areas.networks.height, areas.wallet.y);
    }

    #[test]
    fn test_contains() {
        let rect = Rect::new(10, 5, 4, 2);
        assert!(contains(rect, 10, 5));
        assert!(contains(rect, 13, 6));
        assert!(!contains(rect, 14, 6));
        assert!(!contains(rect, 9, 5));
    }
}
