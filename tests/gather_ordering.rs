//! Fan-in ordering properties: gather's output order is input order under
//! every completion order, and failures are never masked by successes.

use reelplan::{Promise, ReelplanError, TaskQueue};

fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 1 {
        return vec![vec![0]];
    }
    let mut out = Vec::new();
    for rest in permutations(n - 1) {
        for slot in 0..n {
            let mut p: Vec<usize> = rest.iter().map(|&v| v + usize::from(v >= slot)).collect();
            p.insert(0, slot);
            out.push(p);
        }
    }
    out
}

#[test]
fn gather_output_order_is_input_order_for_every_completion_order() {
    for order in permutations(4) {
        let queue = TaskQueue::new();
        let inputs: Vec<Promise<usize>> =
            (0..4).map(|_| Promise::new(queue.clone())).collect();
        let all = Promise::gather(queue.clone(), inputs.clone());

        for &i in &order {
            inputs[i].resolve(i).unwrap();
            // Interleave pumping with completions, as a real loop would.
            queue.run_until_idle();
        }

        assert_eq!(
            all.result().unwrap(),
            vec![0, 1, 2, 3],
            "completion order {order:?}"
        );
    }
}

#[test]
fn a_failure_wins_regardless_of_when_it_arrives() {
    for failing in 0..3usize {
        let queue = TaskQueue::new();
        let inputs: Vec<Promise<usize>> =
            (0..3).map(|_| Promise::new(queue.clone())).collect();
        let all = Promise::gather(queue.clone(), inputs.clone());

        for (i, input) in inputs.iter().enumerate() {
            if i == failing {
                input
                    .fail(ReelplanError::asset_load(format!("input {i}")))
                    .unwrap();
            } else {
                input.resolve(i).unwrap();
            }
        }
        queue.run_until_idle();

        assert_eq!(
            all.result(),
            Err(ReelplanError::asset_load(format!("input {failing}")))
        );
    }
}

#[test]
fn then_chain_over_gather_propagates_the_original_error() {
    let queue = TaskQueue::new();
    let a: Promise<u32> = Promise::new(queue.clone());
    let b: Promise<u32> = Promise::new(queue.clone());
    let summed = Promise::gather(queue.clone(), vec![a.clone(), b.clone()])
        .then(|values| Ok(values.iter().sum::<u32>()))
        .then(|sum: u32| Ok(sum * 10));

    a.resolve(1).unwrap();
    b.fail(ReelplanError::asset_load("dropped")).unwrap();
    queue.run_until_idle();

    assert_eq!(summed.result(), Err(ReelplanError::asset_load("dropped")));
}
