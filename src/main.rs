use clap::Parser;
use proximity_siren::config::{self, Config, SensorConfig, SirenConfig, StreamConfig};
use proximity_siren::mapper::GainCurve;
use proximity_siren::utils::{hc_sr04::HcSr04, led::Led, pcm_setup::AlsaOutput};
use proximity_siren::{ControlLoop, Result};
use rppal::gpio::Gpio;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{error, info};

static STOP_SIGNAL: AtomicBool = AtomicBool::new(false);

#[derive(Parser, Debug)]
#[command(name = "proximity_siren")]
#[command(about = "Siren that gets louder as an object approaches an HC-SR04 sensor", long_about = None)]
struct Args {
    /// Distance (cm) below which the siren sounds and the LED lights
    #[arg(long, default_value_t = config::DISTANCE_THRESHOLD_CM)]
    threshold_cm: f32,

    /// Shape of the distance to loudness curve
    #[arg(long, value_enum, default_value_t = GainCurve::Linear)]
    curve: GainCurve,

    #[arg(long, default_value_t = config::POLL_INTERVAL.as_millis() as u64)]
    poll_interval_ms: u64,

    #[arg(long, default_value_t = config::ECHO_TIMEOUT.as_millis() as u64)]
    echo_timeout_ms: u64,

    /// ALSA playback device
    #[arg(long, default_value = config::PCM_DEVICE_NAME)]
    device: String,

    #[arg(long, default_value_t = config::SAMPLE_RATE_HZ)]
    sample_rate: u32,

    /// Frames per audio buffer
    #[arg(long, default_value_t = config::BUFFER_FRAME_COUNT)]
    buffer_frames: usize,

    /// Buffers in flight between synthesis and the device
    #[arg(long, default_value_t = config::BUFFER_COUNT)]
    buffer_count: usize,

    #[arg(long, default_value_t = config::TONE_LOW_HZ)]
    tone_low_hz: f32,

    #[arg(long, default_value_t = config::TONE_HIGH_HZ)]
    tone_high_hz: f32,

    /// How long each siren tone is held
    #[arg(long, default_value_t = config::TONE_SWITCH_PERIOD.as_millis() as u64)]
    tone_period_ms: u64,

    /// Output level at full gain, as a fraction of full scale
    #[arg(long, default_value_t = config::MAX_AMPLITUDE)]
    max_amplitude: f32,

    /// BCM pin wired to the sensor's trigger
    #[arg(long, default_value_t = config::TRIGGER_PIN)]
    trigger_pin: u8,

    /// BCM pin wired to the sensor's echo
    #[arg(long, default_value_t = config::ECHO_PIN)]
    echo_pin: u8,

    /// BCM pin driving the LED
    #[arg(long, default_value_t = config::LED_PIN)]
    led_pin: u8,
}

impl Args {
    fn to_config(&self) -> Config {
        Config {
            distance_threshold_cm: self.threshold_cm,
            gain_curve: self.curve,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            sensor: SensorConfig {
                echo_timeout: Duration::from_millis(self.echo_timeout_ms),
                ..SensorConfig::default()
            },
            siren: SirenConfig {
                tone_low_hz: self.tone_low_hz,
                tone_high_hz: self.tone_high_hz,
                tone_switch_period: Duration::from_millis(self.tone_period_ms),
                max_amplitude: self.max_amplitude,
                ..SirenConfig::default()
            },
            stream: StreamConfig {
                sample_rate: self.sample_rate,
                buffer_frame_count: self.buffer_frames,
                buffer_count: self.buffer_count,
                ..StreamConfig::default()
            },
        }
    }
}

extern "C" fn on_stop_signal(_signal: libc::c_int) {
    STOP_SIGNAL.store(true, Ordering::SeqCst);
}

fn install_stop_handler() -> std::io::Result<()> {
    let handler = on_stop_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signal in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: the handler only stores to an atomic, which is async-signal-safe
        let previous = unsafe { libc::signal(signal, handler) };
        if previous == libc::SIG_ERR {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = args.to_config();
    config.validate()?;

    let gpio = Gpio::new()?;
    let sensor = HcSr04::new(&gpio, args.trigger_pin, args.echo_pin)?;
    let led = Led::new(&gpio, args.led_pin)?;
    let audio = AlsaOutput::new(args.device.as_str(), &config.stream);

    let mut control = ControlLoop::new(config, sensor, led, audio)?;
    control.start()?;
    info!("siren armed, press Ctrl+C to stop");

    while control.is_running() && !STOP_SIGNAL.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(50));
    }

    let summary = control.stop()?;
    info!(
        polls = summary.polls,
        valid = summary.valid_samples,
        invalid = summary.invalid_samples,
        buffers = summary.stream.buffers_written,
        reopens = summary.stream.reopens,
        "stopped, GPIO and audio released"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proximity_siren=info".into()),
        )
        .init();

    let args = Args::parse();

    if let Err(err) = install_stop_handler() {
        error!(%err, "failed to install signal handler");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "siren stopped");
            ExitCode::FAILURE
        }
    }
}
