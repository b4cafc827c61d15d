use floatlines_core::{LinesConfig, Mount};
use floatlines_platform::{Color, ContainerSize, FrameQueue, HostEvent, ListenerRegistry, Result};
use floatlines_raster::Canvas;
use glam::Vec2;
use tracing::{debug, info};

const TEXTURE_NAME: &str = "floating-lines";

pub struct ViewerOptions {
    pub title: String,
    pub background: Color,
    pub inner_size: [f32; 2],
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            title: "FloatingLines".into(),
            background: Color::rgb(0x0b, 0x0b, 0x12),
            inner_size: [1280.0, 720.0],
        }
    }
}

/// Open a window running the effect until it is closed.
pub fn run_viewer(config: LinesConfig, options: ViewerOptions) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(options.title.clone())
            .with_inner_size(options.inner_size),
        ..Default::default()
    };
    let ViewerOptions {
        title,
        background,
        inner_size,
    } = options;
    eframe::run_native(
        &title,
        native_options,
        Box::new(move |creation_context| {
            Ok(Box::new(FloatingLinesApp::new(
                creation_context,
                config,
                background,
                inner_size,
            )?))
        }),
    )
    .map_err(|e| format!("viewer failed: {e}"))?;
    info!("viewer closed");
    Ok(())
}

/// The mount plus the host-side handles of its scheduler and listener registry.
pub struct ViewerHost {
    mount: Mount<Canvas, FrameQueue, ListenerRegistry>,
    frames: FrameQueue,
    listeners: ListenerRegistry,
}

impl ViewerHost {
    /// `waker` runs on every frame request; the viewer passes `request_repaint`.
    pub fn new(config: LinesConfig, size: ContainerSize, waker: impl Fn() + 'static) -> Result<Self> {
        let frames = FrameQueue::with_waker(waker);
        let listeners = ListenerRegistry::new();
        let (width, height) = size.backing();
        let mount = Mount::new(
            config,
            size,
            Canvas::new(width, height),
            frames.clone(),
            listeners.clone(),
        )?;
        Ok(Self {
            mount,
            frames,
            listeners,
        })
    }

    pub fn canvas(&self) -> &Canvas {
        self.mount.surface()
    }

    pub fn dispatch(&mut self, event: HostEvent) {
        if self.listeners.is_listening(event.kind()) {
            self.mount.handle_event(event);
        }
    }

    /// Fire every frame due this repaint. Returns how many were drawn.
    pub fn fire_due(&mut self) -> usize {
        self.frames
            .take_due()
            .into_iter()
            .filter(|token| self.mount.on_frame(*token))
            .count()
    }
}

pub struct FloatingLinesApp {
    host: ViewerHost,
    texture: Option<egui::TextureHandle>,
    last_size: ContainerSize,
    last_pointer: Option<Vec2>,
    background: egui::Color32,
}

impl FloatingLinesApp {
    /// `initial_size` is in points; the first update replaces it with the real panel size.
    pub fn new(
        creation_context: &eframe::CreationContext<'_>,
        config: LinesConfig,
        background: Color,
        initial_size: [f32; 2],
    ) -> Result<Self> {
        let egui_context = creation_context.egui_ctx.clone();
        let size = container_size(
            egui::Rect::from_min_size(egui::Pos2::ZERO, initial_size.into()),
            creation_context.egui_ctx.pixels_per_point(),
        );
        let host = ViewerHost::new(config, size, move || egui_context.request_repaint())?;
        Ok(Self {
            host,
            texture: None,
            last_size: size,
            last_pointer: None,
            background: egui::Color32::from_rgba_unmultiplied(
                background.r,
                background.g,
                background.b,
                background.a,
            ),
        })
    }

    fn upload(&mut self, context: &egui::Context) -> Option<egui::TextureId> {
        let canvas = self.host.canvas();
        if canvas.width() == 0 || canvas.height() == 0 {
            return None;
        }
        let image = egui::ColorImage::from_rgba_premultiplied(
            [canvas.width() as usize, canvas.height() as usize],
            canvas.as_premultiplied_bytes(),
        );
        if let Some(texture) = &mut self.texture {
            texture.set(image, egui::TextureOptions::LINEAR);
        } else {
            self.texture = Some(context.load_texture(
                TEXTURE_NAME,
                image,
                egui::TextureOptions::LINEAR,
            ));
        }
        self.texture.as_ref().map(egui::TextureHandle::id)
    }
}

impl eframe::App for FloatingLinesApp {
    fn update(&mut self, context: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(self.background))
            .show(context, |ui| {
                let rect = ui.max_rect();
                let response = ui.allocate_rect(rect, egui::Sense::hover());
                let pixels_per_point = context.pixels_per_point();

                let size = container_size(rect, pixels_per_point);
                if size != self.last_size {
                    debug!("viewer: panel resized to {}x{}", size.width, size.height);
                    self.last_size = size;
                    self.host.dispatch(HostEvent::Resize(size));
                }

                if let Some(hover) = response.hover_pos() {
                    let event = pointer_event(hover, rect.min, pixels_per_point);
                    if let HostEvent::PointerMove { client, .. } = event {
                        if self.last_pointer != Some(client) {
                            self.last_pointer = Some(client);
                            self.host.dispatch(event);
                        }
                    }
                }

                self.host.fire_due();

                if let Some(texture_id) = self.upload(context) {
                    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                    ui.painter()
                        .image(texture_id, rect, uv, egui::Color32::WHITE);
                }
            });
    }
}

/// Panel size in physical pixels, which is the canvas backing resolution.
fn container_size(rect: egui::Rect, pixels_per_point: f32) -> ContainerSize {
    ContainerSize::new(rect.width() * pixels_per_point, rect.height() * pixels_per_point)
}

fn pointer_event(hover: egui::Pos2, panel_origin: egui::Pos2, pixels_per_point: f32) -> HostEvent {
    HostEvent::PointerMove {
        client: Vec2::new(hover.x, hover.y) * pixels_per_point,
        surface_origin: Vec2::new(panel_origin.x, panel_origin.y) * pixels_per_point,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use floatlines_platform::EventKind;
    use std::cell::Cell;
    use std::rc::Rc;

    fn host(config: LinesConfig) -> (ViewerHost, Rc<Cell<u32>>) {
        let repaints = Rc::new(Cell::new(0));
        let counter = Rc::clone(&repaints);
        let host = ViewerHost::new(
            LinesConfig {
                seed: Some(21),
                glow_blur: 0.0,
                ..config
            },
            ContainerSize::new(120.0, 80.0),
            move || counter.set(counter.get() + 1),
        )
        .unwrap();
        (host, repaints)
    }

    #[test]
    fn each_repaint_draws_and_requests_the_next() {
        let (mut host, repaints) = host(LinesConfig::default());
        assert_eq!(repaints.get(), 1);
        assert_eq!(host.fire_due(), 1);
        assert_eq!(repaints.get(), 2);
        assert!(host.canvas().as_premultiplied_bytes().iter().any(|b| *b != 0));
        assert_eq!(host.fire_due(), 1);
        assert_eq!(host.fire_due(), 1);
        assert_eq!(repaints.get(), 4);
    }

    #[test]
    fn dropping_the_host_unbinds_listeners() {
        let (host, _repaints) = host(LinesConfig::default());
        let listeners = host.listeners.clone();
        assert!(listeners.is_listening(EventKind::PointerMove));
        drop(host);
        assert_eq!(listeners.active(), 0);
    }

    #[test]
    fn pointer_only_forwarded_when_interactive() {
        let (mut passive, _) = host(LinesConfig {
            interactive: false,
            ..LinesConfig::default()
        });
        let event = pointer_event(egui::pos2(30.0, 20.0), egui::pos2(0.0, 0.0), 1.0);
        passive.dispatch(event);
        assert_eq!(passive.mount.engine().pointer(), Vec2::ZERO);

        let (mut active, _) = host(LinesConfig::default());
        active.dispatch(event);
        assert_eq!(active.mount.engine().pointer(), Vec2::new(30.0, 20.0));
    }

    #[test]
    fn invalid_config_is_refused() {
        let result = ViewerHost::new(
            LinesConfig {
                line_count: 0,
                ..LinesConfig::default()
            },
            ContainerSize::new(120.0, 80.0),
            || {},
        );
        assert!(result.is_err());
    }

    #[test]
    fn sizes_are_physical_pixels() {
        let rect = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(640.0, 360.0));
        assert_eq!(container_size(rect, 2.0), ContainerSize::new(1280.0, 720.0));
    }

    #[test]
    fn pointer_is_scaled_with_panel_origin() {
        let event = pointer_event(egui::pos2(110.0, 60.0), egui::pos2(10.0, 20.0), 1.5);
        assert_eq!(
            event,
            HostEvent::PointerMove {
                client: Vec2::new(165.0, 90.0),
                surface_origin: Vec2::new(15.0, 30.0),
            }
        );
    }
}
