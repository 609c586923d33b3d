use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{Builder, JoinHandle};

use anyhow::{Context, Result};
use log::{debug, error, info};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use winit::event_loop::{EventLoopBuilder, EventLoopProxy};
use winit::window::WindowBuilder;

use flat_tracer::{render_frame, Camera, FrameBuffer, FrameStats, RenderSettings, Scene};

use crate::gpu::{Gpu, Presenter};

/// Camera step per arrow key press, in world units.
const PAN_STEP: f32 = 1.0;

#[derive(Debug)]
pub enum AppEvent {
    FrameReady(FrameStats),
}

/// Maps an arrow key to the camera move it triggers as `(dx, dz)`.
pub fn pan_for_key(key: VirtualKeyCode) -> Option<(f32, f32)> {
    match key {
        VirtualKeyCode::Left => Some((-PAN_STEP, 0.0)),
        VirtualKeyCode::Right => Some((PAN_STEP, 0.0)),
        VirtualKeyCode::Up => Some((0.0, -PAN_STEP)),
        VirtualKeyCode::Down => Some((0.0, PAN_STEP)),
        _ => None,
    }
}

/// Renders a frame for every camera snapshot it receives and swaps the
/// result into `presented`. The trigger channel holds at most one pending
/// snapshot, so triggers arriving during a pass are dropped instead of
/// queueing up.
fn spawn_worker(
    scene: Arc<Scene>,
    settings: RenderSettings,
    presented: Arc<Mutex<FrameBuffer>>,
    triggers: Receiver<Camera>,
    proxy: EventLoopProxy<AppEvent>,
) -> Result<JoinHandle<()>> {
    let mut back = presented.lock().expect("frame lock").clone();

    info!(target: "app", "Spawning worker thread");
    Builder::new()
        .name("render".into())
        .spawn(move || {
            while let Ok(camera) = triggers.recv() {
                let stats = render_frame(&scene, &camera, &settings, &mut back);
                {
                    let mut front = presented.lock().expect("frame submission lock");
                    std::mem::swap(&mut *front, &mut back);
                }
                if proxy.send_event(AppEvent::FrameReady(stats)).is_err() {
                    break;
                }
            }
            info!(target: "app", "Worker lost its event loop, stopping");
        })
        .context("spawn render worker")
}

fn request_frame(triggers: &SyncSender<Camera>, camera: &Camera) {
    match triggers.try_send(camera.clone()) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => debug!(target: "app", "Render pass in flight, skipping trigger"),
        Err(TrySendError::Disconnected(_)) => error!(target: "app", "Render worker is gone"),
    }
}

pub fn run(scene: Scene, mut camera: Camera, settings: RenderSettings, frame: FrameBuffer) -> Result<()> {
    let event_loop = EventLoopBuilder::<AppEvent>::with_user_event().build();

    let window = WindowBuilder::new()
        .with_title("flat-tracer")
        .with_inner_size(LogicalSize::new(frame.width(), frame.height()))
        .build(&event_loop)
        .context("create window")?;

    let frame_size = (frame.width(), frame.height());
    let mut presenter = smol::block_on(async {
        let (gpu, surface) = Gpu::new(&window).await?;
        let size = window.inner_size();
        Presenter::new(gpu, surface, (size.width, size.height), frame_size)
    })?;

    let presented = Arc::new(Mutex::new(frame));
    let (triggers, receiver) = sync_channel(1);
    spawn_worker(Arc::new(scene), settings, presented.clone(), receiver, event_loop.create_proxy())?;

    event_loop.run(move |event, _, control_flow| {
        control_flow.set_poll();

        match event {
            Event::RedrawRequested(window_id) if window.id() == window_id => {
                let result = {
                    let frame = presented.lock().expect("frame upload");
                    presenter.present(&frame)
                };
                if let Err(err) = result {
                    error!(target: "app", "Presenting frame failed: {:#}", err);
                    control_flow.set_exit();
                    return;
                }
                request_frame(&triggers, &camera);
            }
            Event::RedrawEventsCleared => {
                window.request_redraw();
            }
            Event::UserEvent(AppEvent::FrameReady(stats)) => {
                window.set_title(&format!("flat-tracer - Rendering time: {}ms", stats.elapsed.as_millis()));
            }
            Event::WindowEvent { event, window_id } if window.id() == window_id => match event {
                WindowEvent::Resized(size) => {
                    presenter.surface_resize((size.width, size.height));
                }
                WindowEvent::CloseRequested => control_flow.set_exit(),
                WindowEvent::KeyboardInput {
                    input: KeyboardInput { state: ElementState::Pressed, virtual_keycode: Some(key), .. },
                    ..
                } => {
                    if let Some((dx, dz)) = pan_for_key(key) {
                        camera.pan(dx, dz);
                        debug!(target: "app", "Camera moved to {:?}", camera.position);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_keys_pan_on_the_ground_plane() {
        assert_eq!(pan_for_key(VirtualKeyCode::Left), Some((-1.0, 0.0)));
        assert_eq!(pan_for_key(VirtualKeyCode::Right), Some((1.0, 0.0)));
        assert_eq!(pan_for_key(VirtualKeyCode::Up), Some((0.0, -1.0)));
        assert_eq!(pan_for_key(VirtualKeyCode::Down), Some((0.0, 1.0)));
        assert_eq!(pan_for_key(VirtualKeyCode::Space), None);
    }
}
