//! Terminal, audio and keyboard devices for the binary.
use std::io::Stdout;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use chip8::prelude::{Beeper, Damage, DisplayBuffer, InputEvent, InputSource, Renderer};
use crossterm::{
    event, execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, trace};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};
use rodio::{OutputStream, Sink, Source, source::SineWave};

pub const DEFAULT_FREQUENCY: f32 = 440.0;

const KEY_MAPPING: &str = "Key Mapping:\n\
    1 2 3 4    →    1 2 3 C\n\
    Q W E R    →    4 5 6 D\n\
    A S D F    →    7 8 9 E\n\
    Z X C V    →    A 0 B F";

pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    title: String,
}

impl TerminalRenderer {
    pub fn new(title: String) -> std::io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        Ok(TerminalRenderer { terminal, title })
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        let restored = disable_raw_mode()
            .and_then(|_| execute!(self.terminal.backend_mut(), LeaveAlternateScreen))
            .and_then(|_| self.terminal.show_cursor());
        if let Err(err) = restored {
            error!("failed to restore terminal: {err}");
        }
    }
}

impl Renderer for TerminalRenderer {
    fn present(&mut self, display: &DisplayBuffer, damage: &Damage) -> std::io::Result<()> {
        trace!(
            "present: cleared={} rects={} rows={}",
            damage.cleared,
            damage.rects.len(),
            damage.rows.len()
        );

        // Consume and discard any crossterm events to prevent echoing
        while event::poll(Duration::ZERO)? {
            let _ = event::read()?;
        }

        let title = self.title.as_str();
        self.terminal.draw(|frame| draw(frame, display, title))?;
        Ok(())
    }
}

fn draw(frame: &mut ratatui::Frame, display: &DisplayBuffer, title: &str) {
    let area = frame.area();

    // Exact size for the game plus borders
    let game_width = border_size(display.width());
    let game_height = border_size(display.height());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(game_height),
            Constraint::Length(7),
            Constraint::Min(0),
        ])
        .split(area);

    // Center the game horizontally if the terminal is wider than needed
    let game_area = if chunks[0].width > game_width {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(game_width),
                Constraint::Min(0),
            ])
            .split(chunks[0])[1]
    } else {
        chunks[0]
    };

    let mut screen = String::with_capacity((display.width() + 1) * display.height());
    for y in 0..display.height() {
        screen.extend(display.row(y).map(|lit| if lit { '█' } else { ' ' }));
        screen.push('\n');
    }
    let game = Paragraph::new(screen)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::White));
    frame.render_widget(game, game_area);

    let keys = Paragraph::new(KEY_MAPPING)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Keypad"))
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(keys, chunks[1]);
}

fn border_size(cells: usize) -> u16 {
    u16::try_from(cells).unwrap_or(u16::MAX).saturating_add(2)
}

/// Sine tone on the default output device.
pub struct Beep {
    sink: Sink,
    #[allow(dead_code)]
    stream: OutputStream,
}

impl Beep {
    pub fn new(freq: f32) -> anyhow::Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&stream_handle)?;
        let source = SineWave::new(freq).repeat_infinite();

        sink.append(source);
        sink.pause();

        Ok(Self { sink, stream })
    }
}

impl Beeper for Beep {
    fn tone_on(&mut self) {
        self.sink.play();
    }

    fn tone_off(&mut self) {
        self.sink.pause();
    }
}

/// Used when no audio device is available.
pub struct Silence;

impl Beeper for Silence {
    fn tone_on(&mut self) {}

    fn tone_off(&mut self) {}
}

/// Global keyboard hook feeding key press and release events.
pub struct KeyboardInput {
    events: Receiver<InputEvent>,
}

impl KeyboardInput {
    pub fn spawn() -> Self {
        let (tx, events) = mpsc::channel();
        thread::spawn(move || {
            let listened = rdev::listen(move |event| {
                let mapped = match event.event_type {
                    rdev::EventType::KeyPress(rdev::Key::Escape) => Some(InputEvent::Quit),
                    rdev::EventType::KeyPress(key) => map_key(key).map(InputEvent::KeyDown),
                    rdev::EventType::KeyRelease(key) => map_key(key).map(InputEvent::KeyUp),
                    _ => None,
                };
                if let Some(mapped) = mapped {
                    let _ = tx.send(mapped);
                }
            });
            if let Err(err) = listened {
                error!("keyboard listener failed: {err:?}");
            }
        });
        KeyboardInput { events }
    }
}

impl InputSource for KeyboardInput {
    fn poll(&mut self) -> Option<InputEvent> {
        self.events.try_recv().ok()
    }
}

/// COSMAC VIP keypad laid over the left side of a QWERTY keyboard.
fn map_key(key: rdev::Key) -> Option<u8> {
    use rdev::Key::*;

    let hex = match key {
        Num1 => 0x1,
        Num2 => 0x2,
        Num3 => 0x3,
        Num4 => 0xC,
        KeyQ => 0x4,
        KeyW => 0x5,
        KeyE => 0x6,
        KeyR => 0xD,
        KeyA => 0x7,
        KeyS => 0x8,
        KeyD => 0x9,
        KeyF => 0xE,
        KeyZ => 0xA,
        KeyX => 0x0,
        KeyC => 0xB,
        KeyV => 0xF,
        _ => return None,
    };
    Some(hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap_covers_keypad() {
        let keys = [
            rdev::Key::Num1,
            rdev::Key::Num2,
            rdev::Key::Num3,
            rdev::Key::Num4,
            rdev::Key::KeyQ,
            rdev::Key::KeyW,
            rdev::Key::KeyE,
            rdev::Key::KeyR,
            rdev::Key::KeyA,
            rdev::Key::KeyS,
            rdev::Key::KeyD,
            rdev::Key::KeyF,
            rdev::Key::KeyZ,
            rdev::Key::KeyX,
            rdev::Key::KeyC,
            rdev::Key::KeyV,
        ];
        let mut seen: Vec<u8> = keys.into_iter().filter_map(map_key).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<u8>>());
        assert_eq!(map_key(rdev::Key::Space), None);
    }

    #[test]
    fn test_border_size_saturates() {
        assert_eq!(border_size(64), 66);
        assert_eq!(border_size(usize::from(u16::MAX) - 1), u16::MAX);
        assert_eq!(border_size(1 << 20), u16::MAX);
    }
}
