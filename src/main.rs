mod clock;
mod config;
mod grid_pane;
mod osc_sink;
mod setup;
mod ui;

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use weft_core::playback::Scheduler;
use weft_core::{dispatch_action, SequencerState};

use clock::TransportClock;
use config::Config;
use grid_pane::GridPane;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn main() -> io::Result<()> {
    setup::init_logging();
    let config = Config::load();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &config);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
) -> io::Result<()> {
    let keymap = ui::keybindings::load_keymap();
    let help = keymap.help_line();
    let mut seq = SequencerState::new();
    seq.quantize = config.quantize;
    seq.set_pattern_cycles(config.pattern_cycles);

    let mut pane = GridPane::new();
    let mut transport = TransportClock::new(config.cycles_per_second);
    let mut scheduler = Scheduler::new();
    let mut sink = setup::preview_output(&config.osc_addr);
    let mut compiled = String::new();
    let mut last_render = Instant::now() - FRAME_INTERVAL;

    log::info!("weft started");
    loop {
        if event::poll(Duration::from_millis(2))? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if let Some(name) = keymap.resolve(&key) {
                        let was_playing = seq.playing;
                        let result = dispatch_action(&ui::keybindings::parse_action(name), &mut seq);
                        if result.quit {
                            break;
                        }
                        if let Some(text) = result.compiled {
                            log::info!("compiled: {text}");
                            compiled = text;
                        }
                        if seq.playing != was_playing {
                            if seq.playing {
                                transport.start();
                            } else {
                                transport.stop();
                                scheduler.stop(&mut sink);
                            }
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    pane.handle_mouse(&mouse, &mut seq);
                }
                _ => {}
            }
        }

        if seq.playing && transport.is_running() {
            scheduler.tick(
                seq.store().notes(),
                seq.pattern_cycles,
                &transport,
                &mut sink,
            );
        }

        if last_render.elapsed() >= FRAME_INTERVAL {
            let playhead = seq.playing.then(|| scheduler.playhead_slot());
            terminal.draw(|frame| {
                let area = frame.area();
                pane.render(frame.buffer_mut(), area, &seq, playhead, &compiled, &help);
            })?;
            last_render = Instant::now();
        }
    }

    scheduler.stop(&mut sink);
    log::info!("weft exiting");
    Ok(())
}
