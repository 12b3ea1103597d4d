mod fold_props;
