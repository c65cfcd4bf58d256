use cgmath::Vector3;
use std::{path::PathBuf, sync::Arc, time::Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    error::EventLoopError,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::{
    config::EditorConfig,
    gfx::{
        camera::{camera_controller::CameraController, camera_utils::CameraManager, fly_camera::FlyCamera},
        rendering::RenderEngine,
        scene::{
            object::{ObjectId, ObjectKind},
            scene::{EditorIntent, Scene},
        },
    },
    ui::{editor_panel, PanelState, UiManager},
};

/// What a key press asks the app to do
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Intent(EditorIntent),
    Quit,
}

/// Maps an editor shortcut to an action
///
/// Camera movement keys are not shortcuts and map to `None`.
pub fn key_action(
    code: KeyCode,
    ctrl: bool,
    selected: Option<ObjectId>,
    project_path: &str,
) -> Option<KeyAction> {
    let intent = |intent| Some(KeyAction::Intent(intent));
    let path = || PathBuf::from(project_path.trim());

    if ctrl {
        return match code {
            KeyCode::KeyZ => intent(EditorIntent::Undo),
            KeyCode::KeyY => intent(EditorIntent::Redo),
            KeyCode::KeyX => intent(EditorIntent::Cut(selected?)),
            KeyCode::KeyC => intent(EditorIntent::Copy(selected?)),
            KeyCode::KeyV => intent(EditorIntent::Paste),
            KeyCode::KeyS => intent(EditorIntent::SaveProject(path())),
            KeyCode::KeyO => intent(EditorIntent::LoadProject(path())),
            KeyCode::KeyN => intent(EditorIntent::NewProject),
            _ => None,
        };
    }

    let primitive = |index: usize| intent(EditorIntent::AddObject(ObjectKind::PRIMITIVES[index]));
    match code {
        KeyCode::Escape => Some(KeyAction::Quit),
        KeyCode::Delete => intent(EditorIntent::RemoveObject(selected?)),
        KeyCode::Digit1 => primitive(0),
        KeyCode::Digit2 => primitive(1),
        KeyCode::Digit3 => primitive(2),
        KeyCode::Digit4 => primitive(3),
        KeyCode::Digit5 => primitive(4),
        _ => None,
    }
}

pub struct EditorApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: EditorConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    panel: PanelState,
    last_frame: Instant,
    ctrl_held: bool,
}

impl EditorApp {
    pub fn new(config: EditorConfig) -> Result<Self, EventLoopError> {
        let event_loop = EventLoop::new()?;

        let aspect = config.window.width as f32 / config.window.height.max(1) as f32;
        let camera = FlyCamera::new(Vector3::new(0.0, 0.0, 3.0), aspect);
        let camera_manager = CameraManager::new(camera, CameraController::new());
        let scene = Scene::from_config(&config, camera_manager);
        let panel = PanelState::new(&config.scene.project_path.to_string_lossy());

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                scene,
                panel,
                last_frame: Instant::now(),
                ctrl_held: false,
            },
        })
    }

    /// The scene the editor will open with
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.app_state.scene
    }

    /// Runs the event loop until the window closes
    pub fn run(mut self) -> Result<(), EventLoopError> {
        let Some(event_loop) = self.event_loop.take() else {
            return Ok(());
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)
    }
}

impl AppState {
    fn apply_intent(&mut self, intent: EditorIntent) {
        let clears_status = matches!(
            intent,
            EditorIntent::SaveProject(_)
                | EditorIntent::LoadProject(_)
                | EditorIntent::NewProject
                | EditorIntent::ImportMesh(_)
                | EditorIntent::LoadTexture { .. }
        );

        match self.scene.apply(intent) {
            Ok(()) if clears_status => self.panel.status = None,
            Ok(()) => (),
            Err(err) => {
                log::warn!("{err}");
                self.panel.status = Some(err.to_string());
            }
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };

        if event.state == ElementState::Pressed && !event.repeat {
            match key_action(
                code,
                self.ctrl_held,
                self.scene.selected(),
                &self.panel.project_path,
            ) {
                Some(KeyAction::Quit) => {
                    event_loop.exit();
                    return;
                }
                Some(KeyAction::Intent(intent)) => self.apply_intent(intent),
                None => (),
            }
        }

        // Ctrl+S must not also move the camera; releases always pass so keys never stick
        if !self.ctrl_held || event.state == ElementState::Released {
            self.scene.camera_manager.process_keyboard_event(event);
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let now = Instant::now();
        let delta_time = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.scene.update(delta_time);

        let intents = match self.ui_manager.as_mut() {
            Some(ui_manager) => {
                ui_manager.update_logic(&window, |ui| editor_panel(ui, &self.scene, &mut self.panel))
            }
            None => Vec::new(),
        };
        for intent in intents {
            self.apply_intent(intent);
        }

        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };
        let ui_manager = self.ui_manager.as_mut();
        let drew_ui = ui_manager.is_some();
        let overlay = ui_manager.map(|ui_manager| {
            move |device: &wgpu::Device,
                  queue: &wgpu::Queue,
                  encoder: &mut wgpu::CommandEncoder,
                  view: &wgpu::TextureView| {
                ui_manager.render_display_only(device, queue, encoder, view)
            }
        });

        let result = render_engine.render_frame(&mut self.scene, overlay);
        if result.is_err() && drew_ui {
            if let Some(ui_manager) = self.ui_manager.as_mut() {
                ui_manager.discard_frame();
            }
        }

        match result {
            Ok(()) => (),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::error!("Surface lost, reconfiguring");
                render_engine.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(err) => log::warn!("Skipped frame: {err}"),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let (width, height) = window.inner_size().into();
        let render_engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            &self.config.window,
        ));
        self.scene
            .camera_manager
            .camera
            .resize_projection(width, height);

        let mut ui_manager = UiManager::new(
            render_engine.device(),
            render_engine.queue(),
            render_engine.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(render_engine);
        self.window = Some(window);
        self.last_frame = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let captured = self
            .ui_manager
            .as_mut()
            .is_some_and(|ui| ui.handle_input(&window, window_id, &event));
        if captured {
            if let WindowEvent::KeyboardInput { event, .. } = &event {
                if event.state == ElementState::Released {
                    self.scene.camera_manager.process_keyboard_event(event);
                }
            }
            window.request_redraw();
            return;
        }

        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.ctrl_held = modifiers.state().control_key();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event_loop, &event);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.scene
                    .camera_manager
                    .process_mouse_button(button, state);
            }
            WindowEvent::Focused(false) => {
                self.scene.camera_manager.controller.release_all();
                self.ctrl_held = false;
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.scene
                    .camera_manager
                    .camera
                    .resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        if self.ui_manager.as_ref().is_some_and(UiManager::wants_mouse) {
            return;
        }

        self.scene.camera_manager.process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent_for(code: KeyCode, ctrl: bool, selected: Option<ObjectId>) -> Option<EditorIntent> {
        match key_action(code, ctrl, selected, "scene.json")? {
            KeyAction::Intent(intent) => Some(intent),
            KeyAction::Quit => None,
        }
    }

    #[test]
    fn test_history_shortcuts() {
        assert_eq!(intent_for(KeyCode::KeyZ, true, None), Some(EditorIntent::Undo));
        assert_eq!(intent_for(KeyCode::KeyY, true, None), Some(EditorIntent::Redo));
        // Plain Z is not a shortcut
        assert_eq!(key_action(KeyCode::KeyZ, false, None, "scene.json"), None);
    }

    #[test]
    fn test_clipboard_shortcuts_need_a_selection() {
        let id = ObjectId(7);
        assert_eq!(intent_for(KeyCode::KeyC, true, Some(id)), Some(EditorIntent::Copy(id)));
        assert_eq!(intent_for(KeyCode::KeyX, true, Some(id)), Some(EditorIntent::Cut(id)));
        assert_eq!(key_action(KeyCode::KeyC, true, None, "scene.json"), None);
        assert_eq!(key_action(KeyCode::KeyX, true, None, "scene.json"), None);
        assert_eq!(intent_for(KeyCode::KeyV, true, None), Some(EditorIntent::Paste));
    }

    #[test]
    fn test_delete_removes_selection() {
        let id = ObjectId(2);
        assert_eq!(
            intent_for(KeyCode::Delete, false, Some(id)),
            Some(EditorIntent::RemoveObject(id))
        );
        assert_eq!(key_action(KeyCode::Delete, false, None, "scene.json"), None);
    }

    #[test]
    fn test_digits_add_primitives() {
        let digits = [
            KeyCode::Digit1,
            KeyCode::Digit2,
            KeyCode::Digit3,
            KeyCode::Digit4,
            KeyCode::Digit5,
        ];
        for (code, kind) in digits.into_iter().zip(ObjectKind::PRIMITIVES) {
            assert_eq!(intent_for(code, false, None), Some(EditorIntent::AddObject(kind)));
        }
        assert_eq!(key_action(KeyCode::Digit6, false, None, "scene.json"), None);
    }

    #[test]
    fn test_project_shortcuts_use_panel_path() {
        assert_eq!(
            key_action(KeyCode::KeyS, true, None, " levels/one.json "),
            Some(KeyAction::Intent(EditorIntent::SaveProject(PathBuf::from(
                "levels/one.json"
            ))))
        );
        assert_eq!(
            intent_for(KeyCode::KeyO, true, None),
            Some(EditorIntent::LoadProject(PathBuf::from("scene.json")))
        );
        assert_eq!(intent_for(KeyCode::KeyN, true, None), Some(EditorIntent::NewProject));
    }

    #[test]
    fn test_camera_keys_are_not_shortcuts() {
        for code in [KeyCode::KeyW, KeyCode::KeyA, KeyCode::KeyS, KeyCode::KeyD, KeyCode::Space] {
            assert_eq!(key_action(code, false, Some(ObjectId(1)), "scene.json"), None);
        }
    }

    #[test]
    fn test_escape_quits() {
        assert_eq!(key_action(KeyCode::Escape, false, None, "scene.json"), Some(KeyAction::Quit));
    }
}
