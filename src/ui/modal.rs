use crate::ui::{
    layout::create_modal_area,
    styles::{error_style, modal_bg_style, modal_title_style},
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Shown instead of the list until an account is configured
pub fn render_signed_out(f: &mut Frame, area: Rect) {
    let modal_area = create_modal_area(area);
    f.render_widget(Clear, modal_area);

    let lines = vec![
        Line::raw(""),
        Line::raw("  You are not signed in."),
        Line::raw(""),
        Line::from(vec![
            Span::raw("  Run "),
            Span::styled("ticklist login <email>", modal_title_style()),
            Span::raw(" and start again."),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::styled("  [q]", modal_title_style()),
            Span::raw(" Quit"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" Sign in ", modal_title_style()))
                .style(modal_bg_style()),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, modal_area);
}

/// Terminal error view for a failed initial load
pub fn render_load_failed(f: &mut Frame, message: &str, area: Rect) {
    let modal_area = create_modal_area(area);
    f.render_widget(Clear, modal_area);

    let lines = vec![
        Line::raw(""),
        Line::raw("  Could not load your tasks:"),
        Line::raw(""),
        Line::from(Span::styled(format!("  {}", message), error_style())),
        Line::raw(""),
        Line::from(vec![
            Span::styled("  [q]", modal_title_style()),
            Span::raw(" Quit"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" Error ", error_style()))
                .style(modal_bg_style()),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, modal_area);
}
