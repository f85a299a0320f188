use bevy::prelude::*;

#[derive(Component)]
pub struct MainCamera;

/// Camera trails the runner by this offset.
pub const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 6.0, -12.0);

pub fn setup(mut commands: Commands) {
    // 1) Light
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 12.0, -4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // 2) Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(CAMERA_OFFSET).looking_at(Vec3::Z * 10.0, Vec3::Y),
        MainCamera,
    ));
}
