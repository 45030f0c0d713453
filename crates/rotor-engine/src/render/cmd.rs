use crate::device::{AttribLocation, BufferId, ProgramId, UniformLocation};

/// Backend-agnostic frame command.
///
/// Commands mutate backend state in recording order, the way calls against a
/// classic immediate-mode context would. Bindings are never restored; the single
/// renderer that owns a context re-issues everything it needs each frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Sets the viewport rectangle, origin at the top-left, in physical pixels.
    Viewport { width: u32, height: u32 },

    /// Clears the color buffer to the context clear color and, if `depth`, the
    /// depth buffer to 1.0.
    Clear { depth: bool },

    /// Makes `program` the active program.
    UseProgram(ProgramId),

    /// Uploads a column-major 4x4 matrix to a uniform of the active program.
    UniformMatrix4 {
        location: UniformLocation,
        value: [f32; 16],
    },

    /// Sources an attribute of the active program from `buffer`.
    ///
    /// Data is `item_size` tightly packed, non-normalized `f32` components per vertex.
    VertexAttrib {
        location: AttribLocation,
        buffer: BufferId,
        item_size: u32,
    },

    /// Draws a triangle list over `count` vertices starting at `first`.
    DrawArrays { first: u32, count: u32 },
}

/// Ordered command stream for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameCommands {
    cmds: Vec<DrawCmd>,
}

impl FrameCommands {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears recorded commands. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    #[inline]
    pub fn push(&mut self, cmd: DrawCmd) {
        self.cmds.push(cmd);
    }

    #[inline]
    pub fn commands(&self) -> &[DrawCmd] {
        &self.cmds
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Returns the last matrix recorded for `location`, if any.
    pub fn uniform_matrix(&self, location: UniformLocation) -> Option<[f32; 16]> {
        self.cmds.iter().rev().find_map(|cmd| match cmd {
            DrawCmd::UniformMatrix4 { location: l, value } if *l == location => Some(*value),
            _ => None,
        })
    }

    /// Number of draw calls recorded.
    pub fn draw_calls(&self) -> usize {
        self.cmds
            .iter()
            .filter(|cmd| matches!(cmd, DrawCmd::DrawArrays { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(binding: u32) -> UniformLocation {
        UniformLocation { group: 0, binding }
    }

    #[test]
    fn uniform_matrix_returns_latest_write() {
        let mut frame = FrameCommands::new();
        frame.push(DrawCmd::UniformMatrix4 { location: loc(0), value: [1.0; 16] });
        frame.push(DrawCmd::UniformMatrix4 { location: loc(1), value: [2.0; 16] });
        frame.push(DrawCmd::UniformMatrix4 { location: loc(0), value: [3.0; 16] });

        assert_eq!(frame.uniform_matrix(loc(0)), Some([3.0; 16]));
        assert_eq!(frame.uniform_matrix(loc(1)), Some([2.0; 16]));
        assert_eq!(frame.uniform_matrix(loc(7)), None);
    }

    #[test]
    fn clear_keeps_nothing() {
        let mut frame = FrameCommands::new();
        frame.push(DrawCmd::Clear { depth: true });
        frame.push(DrawCmd::DrawArrays { first: 0, count: 3 });
        assert_eq!(frame.draw_calls(), 1);

        frame.clear();
        assert!(frame.is_empty());
        assert_eq!(frame.draw_calls(), 0);
    }
}
