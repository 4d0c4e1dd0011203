use orbit_app::OrbitService;

#[derive(Clone)]
pub struct AppState {
    pub orbit: OrbitService,
}

impl AppState {
    pub fn new(orbit: OrbitService) -> Self {
        Self { orbit }
    }
}
