use super::vertex::VERTEX_COUNT;

/// One step of the fixed per-frame command sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameCommand {
    Clear([f32; 4]),
    BindProgram,
    BindGeometry,
    Draw { first: u32, count: u32 },
    Present,
}

/// Every frame runs exactly this list, in this order.
pub fn frame_plan(clear_color: [f32; 4]) -> [FrameCommand; 5] {
    [
        FrameCommand::Clear(clear_color),
        FrameCommand::BindProgram,
        FrameCommand::BindGeometry,
        FrameCommand::Draw {
            first: 0,
            count: VERTEX_COUNT,
        },
        FrameCommand::Present,
    ]
}
