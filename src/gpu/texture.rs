use std::collections::HashMap;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Albedo textures keyed by the scene's string handles. Each entry is a
/// ready-to-bind texture + sampler group.
pub struct TextureRegistry {
    layout: wgpu::BindGroupLayout,
    bind_groups: HashMap<String, wgpu::BindGroup>,
}

impl TextureRegistry {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("texture_bind_group_layout"),
        });
        Self {
            layout,
            bind_groups: HashMap::new(),
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bind_groups.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&wgpu::BindGroup> {
        self.bind_groups.get(name)
    }

    /// Upload an RGBA8 pixel grid as a named texture.
    pub fn insert_rgba(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: impl Into<String>,
        size: u32,
        pixels: &[u8],
    ) {
        let name = name.into();
        assert_eq!(pixels.len(), (size * size * 4) as usize);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&name),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size * 4),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some(&name),
        });
        self.bind_groups.insert(name, bind_group);
    }

    /// Register the built-in procedural set: three crate checkerboards and a
    /// plain cat coat.
    pub fn insert_builtins(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let palette: [(&str, [u8; 3], [u8; 3]); 3] = [
            ("crate0", [181, 101, 29], [120, 66, 18]),
            ("crate1", [160, 160, 170], [90, 90, 100]),
            ("crate2", [60, 120, 60], [30, 70, 30]),
        ];
        for (name, a, b) in palette {
            let pixels = checkerboard(64, 8, a, b);
            self.insert_rgba(device, queue, name, 64, &pixels);
        }
        let cat = checkerboard(64, 64, [90, 70, 60], [80, 62, 53]);
        self.insert_rgba(device, queue, "cat", 64, &cat);
    }
}

/// RGBA8 checkerboard, `cells` squares per edge.
pub fn checkerboard(size: u32, cells: u32, a: [u8; 3], b: [u8; 3]) -> Vec<u8> {
    let cell = (size / cells).max(1);
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let color = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
            pixels.extend_from_slice(&[color[0], color[1], color[2], 255]);
        }
    }
    pixels
}

/// Window-sized depth texture, used for both the main pass depth buffer and
/// the shadow map.
pub fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    label: &str,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_alternates_cells() {
        let pixels = checkerboard(8, 2, [255, 0, 0], [0, 255, 0]);
        assert_eq!(pixels.len(), 8 * 8 * 4);
        // Opposite corners of a 2x2 board share a color.
        assert_eq!(pixels[0], 255);
        let last = (8 * 8 - 1) * 4;
        assert_eq!(pixels[last], 255);
        // Top-right corner is the other color.
        let top_right = (8 - 1) * 4;
        assert_eq!(pixels[top_right], 0);
        assert_eq!(pixels[top_right + 1], 255);
    }

    #[test]
    fn checkerboard_is_opaque() {
        let pixels = checkerboard(16, 4, [1, 2, 3], [4, 5, 6]);
        assert!(pixels.chunks(4).all(|p| p[3] == 255));
    }
}
