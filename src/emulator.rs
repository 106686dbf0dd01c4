use std::io::Stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use chip8vm::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Machine, Scheduler};
use crossterm::{
    event,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};
use rodio::{OutputStream, Sink, Source, source::SineWave};

use crate::keymap::HostKeys;

const DEFAULT_FREQUENCY: f32 = 440.0;

pub struct Settings {
    pub frame_rate: u64,
    pub ips: u64,
    pub rom: PathBuf,
    /// Stop on stack faults instead of logging them and carrying on.
    pub halt_on_fault: bool,
}

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

    pub fn on(&mut self) {
        self.sink.play();
    }

    pub fn off(&mut self) {
        self.sink.pause();
    }
}

pub struct Emulator {
    machine: Machine,
    scheduler: Scheduler,
    settings: Settings,
    beeper: Option<Beep>,
    keys: HostKeys,
}

impl Emulator {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        if settings.frame_rate == 0 {
            bail!("Frame rate must be at least 1");
        }
        let beeper = match Beep::new(DEFAULT_FREQUENCY) {
            Ok(beeper) => Some(beeper),
            Err(e) => {
                log::warn!("no audio output, running silent: {e}");
                None
            }
        };
        Ok(Emulator {
            machine: Machine::new(),
            scheduler: Scheduler::from_rates(settings.ips, settings.frame_rate),
            settings,
            beeper,
            keys: HostKeys::listen(),
        })
    }

    fn draw(&self, frame: &mut ratatui::Frame, area: Rect, rom_name: &str) {
        let game_width = (DISPLAY_WIDTH as u16) + 2; // +2 for left and right borders
        let game_height = (DISPLAY_HEIGHT as u16) + 2; // +2 for top and bottom borders

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(game_height),
                Constraint::Length(7),
                Constraint::Min(0),
            ])
            .split(area);

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

        let display = self.machine.display_snapshot();
        let mut screen = String::with_capacity(DISPLAY_WIDTH * DISPLAY_HEIGHT + DISPLAY_HEIGHT);
        for row in 0..DISPLAY_HEIGHT {
            screen.extend(
                display
                    .row(row)
                    .iter()
                    .map(|pixel| if *pixel { '█' } else { ' ' }),
            );
            screen.push('\n');
        }
        let game_paragraph = Paragraph::new(screen)
            .block(Block::default().borders(Borders::ALL).title(rom_name))
            .style(Style::default().fg(Color::White));
        frame.render_widget(game_paragraph, game_area);

        let key_mapping = "Key Mapping:\n\
    1 2 3 4    →    1 2 3 C\n\
    Q W E R    →    4 5 6 D\n\
    A S D F    →    7 8 9 E\n\
    Z X C V    →    A 0 B F";
        let key_paragraph = Paragraph::new(key_mapping)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Keypad"))
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(key_paragraph, chunks[1]);
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let rom_stem: String = self
            .settings
            .rom
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown ROM".to_string());
        let rom_data = std::fs::read(&self.settings.rom)
            .with_context(|| format!("Failed to read ROM {}", self.settings.rom.display()))?;
        self.machine
            .load(&rom_data)
            .with_context(|| format!("Failed to load ROM {}", self.settings.rom.display()))?;
        log::info!(
            "running {rom_stem} at {} instructions per frame",
            self.scheduler.instructions_per_frame()
        );

        enable_raw_mode()?;
        let backend = CrosstermBackend::new(std::io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.main_loop(&mut terminal, &rom_stem);

        if let Some(beeper) = self.beeper.as_mut() {
            beeper.off();
        }
        terminal.clear()?;
        disable_raw_mode()?;
        result
    }

    fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        rom_name: &str,
    ) -> anyhow::Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.settings.frame_rate as f64);
        let mut redraw = true;

        while !self.keys.is_escape_pressed() {
            let frame_start = Instant::now();

            // Consume and discard any crossterm events to prevent echoing
            while event::poll(Duration::ZERO)? {
                if let event::Event::Resize(..) = event::read()? {
                    redraw = true;
                }
            }

            self.machine.set_keys(self.keys.snapshot());
            match self.scheduler.run_frame(&mut self.machine) {
                Ok(report) if report.unknown > 0 => {
                    log::debug!("skipped {} unknown opcodes this frame", report.unknown);
                }
                Ok(_) => {}
                Err(fault) if self.settings.halt_on_fault => {
                    return Err(fault).context("Machine halted");
                }
                Err(fault) => log::error!("{fault}, continuing"),
            }

            if let Some(beeper) = self.beeper.as_mut() {
                if self.machine.sound_active() {
                    beeper.on();
                } else {
                    beeper.off();
                }
            }

            if self.machine.take_draw_flag() || redraw {
                terminal.draw(|frame| {
                    let area = frame.area();
                    self.draw(frame, area, rom_name);
                })?;
                redraw = false;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
        Ok(())
    }
}
