pub fn is_false(value: &bool) -> bool {
    !*value
}

pub fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}
