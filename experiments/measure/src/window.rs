use {
    crate::Screen,
    anyhow::Context,
    base::{Vec2, log},
    image::{decode_data_uri, decode_image, rgb_to_u32},
    minifb::{Key, Window, WindowOptions},
    std::time::Duration,
    tokio::{sync::watch, time::sleep},
};

const FRAME_PERIOD: Duration = Duration::from_millis(33);

fn decode_frame(data_uri: &str) -> anyhow::Result<(Vec2<usize>, Vec<u32>)> {
    let uri = decode_data_uri(data_uri)?;
    let image = decode_image(&uri.bytes)?;
    Ok((image.size, rgb_to_u32(image.size, &image.data)))
}

/// Show processed images until the window closes, ESC is pressed, or the
/// controller goes away.
///
/// The window is not `Send`; run this on the main task.
pub async fn run(mut screens: watch::Receiver<Screen>, size: Vec2<usize>) -> anyhow::Result<()> {
    let mut window = Window::new(
        "Measurements - ESC to exit",
        size.x,
        size.y,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )
    .context("unable to open window")?;

    let mut shown: Option<String> = None;
    let mut buffer = vec![0u32; size.area()];
    let mut buffer_size = size;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        match screens.has_changed() {
            Ok(true) => {
                let screen = screens.borrow_and_update().clone();
                let wanted = screen.view.image.filter(|_| screen.view.image_visible);
                if wanted != shown {
                    match wanted.as_deref().map(decode_frame) {
                        Some(Ok((frame_size, pixels))) => {
                            buffer = pixels;
                            buffer_size = frame_size;
                        }
                        Some(Err(error)) => log::warn!("unable to show processed image: {}", error),
                        None => buffer.fill(0),
                    }
                    shown = wanted;
                }
            }
            Ok(false) => {}
            Err(_) => break,
        }
        window
            .update_with_buffer(&buffer, buffer_size.x, buffer_size.y)
            .context("unable to draw window")?;
        sleep(FRAME_PERIOD).await;
    }
    Ok(())
}
