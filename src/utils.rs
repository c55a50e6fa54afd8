use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// Takes a list where each element is a set of choices, and returns all the possible sets
/// generated. Will clone the elements.
///
/// ```
/// let v = vec![
///   vec![1],
///   vec![2, 3],
///   vec![4],
///   vec![5, 6, 7],
/// ];
///
/// assert_eq!(chartwright::utils::combinations(&v), vec![
///   vec![1, 2, 4, 5],
///   vec![1, 3, 4, 5],
///   vec![1, 2, 4, 6],
///   vec![1, 3, 4, 6],
///   vec![1, 2, 4, 7],
///   vec![1, 3, 4, 7],
/// ]);
/// ```
pub fn combinations<T>(list: &[Vec<T>]) -> Vec<Vec<T>>
where
  T: Clone,
{
  if list.is_empty() {
    // one way to choose nothing from nothing
    vec![Vec::new()]
  } else if list.len() == 1 {
    list[0].iter().map(|e| vec![e.clone()]).collect()
  } else {
    let (head, tail) = list.split_at(1);
    let head = &head[0];

    combinations(tail)
      .into_iter()
      .flat_map(|subseq| {
        // prepend every element of the head to every possible subseq
        head.iter().map(move |v| {
          let mut newseq = subseq.clone();
          newseq.insert(0, v.clone());
          newseq
        })
      })
      .collect()
  }
}

/// Returns every ordering of `items`, in a fixed order (lexicographic by
/// original index). Used by deduction rules that receive their antecedents as
/// an unordered set and have to find the slot assignment themselves.
///
/// ```
/// assert_eq!(chartwright::utils::permutations(&[1, 2, 3]), vec![
///   vec![1, 2, 3],
///   vec![1, 3, 2],
///   vec![2, 1, 3],
///   vec![2, 3, 1],
///   vec![3, 1, 2],
///   vec![3, 2, 1],
/// ]);
/// ```
pub fn permutations<T>(items: &[T]) -> Vec<Vec<T>>
where
  T: Clone,
{
  if items.len() <= 1 {
    return vec![items.to_vec()];
  }

  let mut result = Vec::new();
  for idx in 0..items.len() {
    let mut rest = items.to_vec();
    let head = rest.remove(idx);
    for mut perm in permutations(&rest) {
      perm.insert(0, head.clone());
      result.push(perm);
    }
  }
  result
}
