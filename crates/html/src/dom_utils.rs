use crate::Node;

// Walks keep an explicit stack so nesting depth is bounded only by memory.

/// Finds the first element named `tag` in document order (pre-order).
pub fn find_first_element<'a>(root: &'a Node, tag: &str) -> Option<&'a Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_element_named(tag) {
            return Some(node);
        }
        if let Some(children) = node.children() {
            stack.extend(children.iter().rev());
        }
    }
    None
}

/// Counts elements named `tag` anywhere under `root` (including `root`).
pub fn count_elements(root: &Node, tag: &str) -> usize {
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        count += usize::from(node.is_element_named(tag));
        if let Some(children) = node.children() {
            stack.extend(children);
        }
    }
    count
}

/// Replaces the first element named `tag` (document order, never `root` itself) with
/// `replacement`. Returns the replaced node, or gives `replacement` back in `Err` when no
/// such element exists.
pub fn replace_first_element(
    root: &mut Node,
    tag: &str,
    replacement: Node,
) -> Result<Node, Node> {
    // Locate first with a shared borrow, then walk the recorded child-index path mutably.
    let Some(path) = path_to_first_element(root, tag) else {
        return Err(replacement);
    };
    let Some((&last, parents)) = path.split_last() else {
        return Err(replacement);
    };
    let mut parent = root;
    for &index in parents {
        let Some(next) = parent.children_mut().and_then(|cs| cs.get_mut(index)) else {
            return Err(replacement);
        };
        parent = next;
    }
    match parent.children_mut().and_then(|cs| cs.get_mut(last)) {
        Some(slot) => Ok(std::mem::replace(slot, replacement)),
        None => Err(replacement),
    }
}

/// Child-index path from `root` to the first element named `tag` below it.
fn path_to_first_element(root: &Node, tag: &str) -> Option<Vec<usize>> {
    // One frame per level: the children being scanned and the next index to visit.
    let mut frames: Vec<(&[Node], usize)> = vec![(root.children()?, 0)];
    while let Some(frame) = frames.last_mut() {
        let (children, next) = *frame;
        let Some(child) = children.get(next) else {
            frames.pop();
            continue;
        };
        frame.1 += 1;
        if child.is_element_named(tag) {
            return Some(frames.iter().map(|&(_, next)| next - 1).collect());
        }
        if let Some(grandchildren) = child.children()
            && !grandchildren.is_empty()
        {
            frames.push((grandchildren, 0));
        }
    }
    None
}
