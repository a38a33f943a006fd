//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem, Wrap},
    style::{Color, Style, Modifier},
};
use num_traits::Signed;
use num_bigint::BigInt;
use crate::vm::VmState;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code, machine state and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_machine(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: stack, heap, output and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Min(4),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_stack(frame, right_chunks[0], app);
    draw_heap(frame, right_chunks[1], app);
    draw_output(frame, right_chunks[2], app);
    draw_help(frame, right_chunks[3]);
}

/// Draw the program listing around the current instruction.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(index, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(index) { "●" } else { " " };
            let text = format!("{}{:04}: {}", prefix, index, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(index) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Program ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw program counter, call stack and run state.
fn draw_machine(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let calls: Vec<String> = app.vm.call_stack().iter().map(|a| a.to_string()).collect();

    let content = vec![
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{}", app.vm.pc()), Style::default().fg(Color::Yellow)),
            Span::raw("   Steps: "),
            Span::styled(format!("{}", app.vm.steps()), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::raw("Calls: "),
            Span::styled(format!("[{}]", calls.join(", ")), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("State: "),
            Span::styled(format!("{:?}", app.vm.state()), state_style(app.vm.state())),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Machine ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw the stack, top first.
fn draw_stack(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let items: Vec<ListItem> = app.vm
        .stack()
        .as_slice()
        .iter()
        .rev()
        .take(visible_rows)
        .enumerate()
        .map(|(depth, value)| {
            ListItem::new(format!("{:>3}: {}", depth, value)).style(value_style(value))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(format!(" Stack ({}) ", app.vm.stack().len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw heap cells ordered by key.
fn draw_heap(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let items: Vec<ListItem> = app.vm
        .heap()
        .sorted()
        .into_iter()
        .skip(app.heap_scroll)
        .take(visible_rows)
        .map(|(key, value)| {
            let style = value_style(&value);
            ListItem::new(format!("{} = {}", key, value)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(format!(" Heap ({}) ", app.vm.heap().len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw captured program output.
fn draw_output(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let output = Paragraph::new(app.output_text())
        .wrap(Wrap { trim: false })
        .block(Block::default()
            .title(" Output ")
            .borders(Borders::ALL));

    frame.render_widget(output, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓: Scroll heap  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Color by sign.
fn value_style(value: &BigInt) -> Style {
    if value.is_negative() {
        Style::default().fg(Color::Red)
    } else if value.is_positive() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn state_style(state: VmState) -> Style {
    match state {
        VmState::Running => Style::default().fg(Color::Green),
        VmState::Halted | VmState::Finished => Style::default().fg(Color::Cyan),
        VmState::Interrupted | VmState::Error => Style::default().fg(Color::Red),
    }
}
