//! Object containment-tree traversal.

use crate::error::VmError;
use crate::vm::machine::Vm;
use quoll_common::{TypeTag, Value};

/// `next_object` walks every object depth-first: None starts at the first
/// parentless object; from an object the walk visits its first child,
/// then its sibling, then climbs toward the next unvisited subtree.
/// Parentless objects chain in id order. Pushes None when the walk ends.
pub fn handle_next_object(vm: &mut Vm) -> Result<(), VmError> {
    let from = vm.pop()?;
    let next = match from.tag {
        TypeTag::None => first_root(vm, 1),
        TypeTag::Object => {
            let object = vm.game.object(from.payload)?;
            if object.child != 0 {
                Some(object.child)
            } else {
                climb(vm, from.payload as u32)?
            }
        }
        other => {
            return Err(VmError::TypeMismatch {
                expected: TypeTag::Object,
                found: other,
            })
        }
    };
    match next {
        Some(id) => vm.push(Value::new(TypeTag::Object, id as i32)),
        None => vm.push(Value::none()),
    }
}

fn first_root(vm: &Vm, from_id: u32) -> Option<u32> {
    (from_id as usize..vm.game.objects.len())
        .find(|&at| vm.game.objects[at].parent == 0 && vm.game.objects[at].info.ident != 0)
        .map(|at| at as u32)
}

/// Follow siblings upward until one exists; at a root, continue with the
/// next parentless object.
fn climb(vm: &Vm, mut id: u32) -> Result<Option<u32>, VmError> {
    loop {
        let object = vm.game.object(id as i32)?;
        if object.sibling != 0 {
            return Ok(Some(object.sibling));
        }
        if object.parent == 0 {
            return Ok(first_root(vm, id + 1));
        }
        id = object.parent;
    }
}
