mod orbit;

pub(crate) use orbit::TauriOrbitHost;
